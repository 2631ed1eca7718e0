//! Canonical type graph.
//!
//! Nodes live in an arena and refer to each other by [`TypeId`], so self and
//! mutual references are plain ids and never copies. Named nodes are keyed by
//! their [`Identity`]; anonymous shapes are interned so `[]string` appearing in
//! ten fields is one node.
//!
//! Stages:
//! - `build`: declaration set -> graph (two passes, embedded-field flattening)
//! - `resolve`: promotion dominance, field collisions, destination names
//! - `optionality`: per-field `optional` / `nullable`

mod build;
mod optionality;
mod resolve;
pub mod tags;

use std::collections::HashMap;
use std::fmt;

pub use build::build;
pub use optionality::classify;
pub use resolve::{ordered_fields, resolve};

use crate::decl::ParamEncoding;
use tags::Directives;

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

/// `(package path, origin name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    pub package: String,
    pub name: String,
}

impl Identity {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.name)
    }
}

/// Scalar destinations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Number,
    Boolean,
    /// A well-known external type rendered verbatim, e.g. `time.Time` -> `string`.
    Mapped(String),
}

/// What a node is.
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// Struct; fields in flattened declaration order.
    Record(Vec<FieldSpec>),
    /// Named non-struct type: `type UserID uint64`.
    Alias(TypeId),
    /// Slice, or fixed-length array when `fixed_len` is set.
    Slice { elem: TypeId, fixed_len: Option<usize> },
    /// `[]byte`, which marshals as a base64 string.
    Bytes,
    Map { key: TypeId, value: TypeId },
    Pointer(TypeId),
    Primitive(Primitive),
    /// Anything the builder could not classify.
    Unknown,
    /// `interface{}` and friends.
    InterfaceLike,
}

/// Where a node came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// An exported declaration of the input; rendered by reference.
    Declared(Identity),
    /// A named type outside the input (or unexported); rendered inline.
    External(Identity),
    /// Structural shape or inline struct.
    Anonymous,
}

/// Resolution state of a declared node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeStatus {
    #[default]
    Ok,
    /// Two promoted fields tie for one destination name.
    Collided,
}

#[derive(Debug, Clone)]
pub struct TypeNode {
    pub id: TypeId,
    pub kind: TypeKind,
    pub origin: Origin,
    /// Output name for declared nodes; empty otherwise.
    pub destination_name: String,
    pub status: NodeStatus,
}

impl TypeNode {
    pub fn identity(&self) -> Option<&Identity> {
        match &self.origin {
            Origin::Declared(identity) | Origin::External(identity) => Some(identity),
            Origin::Anonymous => None,
        }
    }

    pub fn is_declared(&self) -> bool {
        matches!(self.origin, Origin::Declared(_))
    }

    pub fn is_record(&self) -> bool {
        matches!(self.kind, TypeKind::Record(_))
    }
}

/// A record field after flattening.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub declared_name: String,
    pub destination_name: String,
    pub ty: TypeId,
    pub optional: bool,
    pub nullable: bool,
    /// Render numbers/booleans as `string` (`,string` tag).
    pub as_string: bool,
    /// Position in the flattened declaration order.
    pub ordinal: usize,
    pub directives: Directives,
    /// 0 for direct fields, +1 per embedding level.
    pub depth: usize,
}

/// Endpoint transport metadata.
#[derive(Debug, Clone)]
pub struct Transport {
    pub method: Option<String>,
    pub path_template: String,
    pub encoding: ParamEncoding,
}

/// An exported endpoint function.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub identity: Identity,
    pub destination_name: String,
    pub params: Vec<(String, TypeId)>,
    /// `None` renders as `Promise<void>`.
    pub result: Option<TypeId>,
    pub transport: Transport,
}

/// A Go package as seen by the grouper.
#[derive(Debug, Clone)]
pub struct PackageInfo {
    pub path: String,
    pub short_name: String,
}

/// Interning key for anonymous structural nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Shape {
    Slice(TypeId, Option<usize>),
    Bytes,
    Map(TypeId, TypeId),
    Pointer(TypeId),
    Primitive(Primitive),
    Unknown,
    InterfaceLike,
}

/// Arena of nodes plus the identity and shape tables.
#[derive(Debug, Default)]
pub struct TypeGraph {
    nodes: Vec<TypeNode>,
    named: HashMap<Identity, TypeId>,
    shapes: HashMap<Shape, TypeId>,
    pub functions: Vec<FunctionSpec>,
    pub packages: Vec<PackageInfo>,
}

impl TypeGraph {
    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: TypeId) -> &mut TypeNode {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TypeNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn lookup(&self, identity: &Identity) -> Option<TypeId> {
        self.named.get(identity).copied()
    }

    /// Declared nodes in arena order.
    pub fn declared(&self) -> impl Iterator<Item = &TypeNode> {
        self.nodes.iter().filter(|n| n.is_declared())
    }

    fn push(&mut self, kind: TypeKind, origin: Origin) -> TypeId {
        let id = TypeId(self.nodes.len());
        self.nodes.push(TypeNode {
            id,
            kind,
            origin,
            destination_name: String::new(),
            status: NodeStatus::Ok,
        });
        id
    }

    /// Register a named node; the same identity always yields the same id.
    pub fn intern_named(&mut self, identity: Identity, kind: TypeKind, declared: bool) -> TypeId {
        if let Some(id) = self.named.get(&identity) {
            return *id;
        }
        let origin = if declared {
            Origin::Declared(identity.clone())
        } else {
            Origin::External(identity.clone())
        };
        let id = self.push(kind, origin);
        self.named.insert(identity, id);
        id
    }

    /// Anonymous record nodes are never shared.
    pub fn push_anonymous_record(&mut self, fields: Vec<FieldSpec>) -> TypeId {
        self.push(TypeKind::Record(fields), Origin::Anonymous)
    }

    fn intern_shape(&mut self, shape: Shape, kind: TypeKind) -> TypeId {
        if let Some(id) = self.shapes.get(&shape) {
            return *id;
        }
        let id = self.push(kind, Origin::Anonymous);
        self.shapes.insert(shape, id);
        id
    }

    pub fn primitive(&mut self, primitive: Primitive) -> TypeId {
        self.intern_shape(
            Shape::Primitive(primitive.clone()),
            TypeKind::Primitive(primitive),
        )
    }

    pub fn slice(&mut self, elem: TypeId, fixed_len: Option<usize>) -> TypeId {
        self.intern_shape(Shape::Slice(elem, fixed_len), TypeKind::Slice { elem, fixed_len })
    }

    pub fn bytes(&mut self) -> TypeId {
        self.intern_shape(Shape::Bytes, TypeKind::Bytes)
    }

    pub fn map(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.intern_shape(Shape::Map(key, value), TypeKind::Map { key, value })
    }

    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.intern_shape(Shape::Pointer(elem), TypeKind::Pointer(elem))
    }

    pub fn unknown(&mut self) -> TypeId {
        self.intern_shape(Shape::Unknown, TypeKind::Unknown)
    }

    pub fn interface_like(&mut self) -> TypeId {
        self.intern_shape(Shape::InterfaceLike, TypeKind::InterfaceLike)
    }

    /// Follow aliases and pointers down to the first other node.
    pub fn underlying(&self, mut id: TypeId) -> TypeId {
        let mut hops = 0;
        while let TypeKind::Alias(target) | TypeKind::Pointer(target) = self.node(id).kind {
            id = target;
            hops += 1;
            // `type A B; type B A` never terminates otherwise.
            if hops > self.nodes.len() {
                break;
            }
        }
        id
    }
}
