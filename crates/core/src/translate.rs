//! Collection & reference translation: graph node -> `TsType`.
//!
//! Declared nodes are always referenced by destination name, qualified with
//! their namespace when they live in another scope. Only anonymous shapes,
//! well-known external types and the top type are written inline, so
//! recursive types never recurse here.

use crate::config::{
    FieldOrdering, GeneratorConfig, MapKeyAliases, MapRepresentation, UnresolvedTypeFallback,
};
use crate::graph::{FieldSpec, NodeStatus, Primitive, TypeGraph, TypeId, TypeKind, ordered_fields};
use crate::namespace::Layout;
use crate::ts::{TsPrimitive, TsProp, TsType};

/// Renders types for one scope against the frozen graph.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'a> {
    graph: &'a TypeGraph,
    layout: &'a Layout,
    config: &'a GeneratorConfig,
    /// Scope being emitted, for namespace qualification.
    scope: Option<usize>,
}

impl<'a> Translator<'a> {
    pub fn new(
        graph: &'a TypeGraph,
        layout: &'a Layout,
        config: &'a GeneratorConfig,
        scope: Option<usize>,
    ) -> Self {
        Self {
            graph,
            layout,
            config,
            scope,
        }
    }

    pub fn graph(&self) -> &'a TypeGraph {
        self.graph
    }

    pub fn top(&self) -> TsType {
        match self.config.unresolved_type_fallback {
            UnresolvedTypeFallback::UnknownMarker => TsType::Primitive(TsPrimitive::Unknown),
            UnresolvedTypeFallback::EscapeMarker => TsType::Primitive(TsPrimitive::Any),
        }
    }

    /// Type expression for a node in field or parameter position.
    pub fn render(&self, id: TypeId) -> TsType {
        let node = self.graph.node(id);
        if node.is_declared() {
            return match self.layout.scope_of(id) {
                Some(scope) => TsType::Ref(self.qualify(scope, &node.destination_name)),
                None => self.top(),
            };
        }

        match &node.kind {
            TypeKind::Record(fields) => {
                if node.status == NodeStatus::Collided {
                    self.top()
                } else {
                    TsType::Object(self.properties(fields))
                }
            }
            TypeKind::Alias(target) => self.render(*target),
            TypeKind::Slice { elem, fixed_len } => {
                let array = TsType::Array(Box::new(self.render(*elem)));
                if fixed_len.is_some() { array } else { array.or_null() }
            }
            TypeKind::Bytes => TsType::STRING.or_null(),
            TypeKind::Map { key, value } => {
                let key = Box::new(self.render_key(*key));
                let value = Box::new(self.render(*value));
                match self.config.map_representation {
                    MapRepresentation::KeyedType => TsType::Map { key, value },
                    MapRepresentation::IndexSignature => TsType::IndexSignature { key, value },
                }
                .or_null()
            }
            TypeKind::Pointer(target) => self.render(*target).or_null(),
            TypeKind::Primitive(primitive) => render_primitive(primitive),
            TypeKind::Unknown | TypeKind::InterfaceLike => self.top(),
        }
    }

    /// The right-hand side of a named declaration.
    pub fn render_definition(&self, id: TypeId) -> TsType {
        match &self.graph.node(id).kind {
            TypeKind::Alias(target) => self.render(*target),
            TypeKind::Record(fields) => TsType::Object(self.properties(fields)),
            _ => self.top(),
        }
    }

    fn render_key(&self, id: TypeId) -> TsType {
        if self.config.map_key_aliases == MapKeyAliases::CoerceString {
            let node = self.graph.node(id);
            let underlying = self.graph.node(self.graph.underlying(id));
            if node.is_declared()
                && matches!(
                    underlying.kind,
                    TypeKind::Primitive(Primitive::Number | Primitive::Boolean)
                )
            {
                return TsType::STRING;
            }
        }
        self.render(id)
    }

    /// Record properties in output order.
    pub fn properties(&self, fields: &[FieldSpec]) -> Vec<TsProp> {
        let lexical = self.config.field_ordering == FieldOrdering::Lexical;
        ordered_fields(fields, lexical)
            .into_iter()
            .map(|field| self.property(field))
            .collect()
    }

    fn property(&self, field: &FieldSpec) -> TsProp {
        let mut ty = if field.as_string {
            TsType::STRING
        } else {
            self.render(field.ty)
        };
        if field.nullable {
            ty = ty.or_null();
        }
        TsProp {
            name: field.destination_name.clone(),
            ty,
            optional: field.optional,
        }
    }

    fn qualify(&self, scope: usize, name: &str) -> String {
        if self.layout.grouped && Some(scope) != self.scope {
            format!("{}.{name}", self.layout.scopes[scope].name)
        } else {
            name.to_string()
        }
    }

    /// Whether a node renders as the top type because it could not be
    /// resolved (unknown, dropped by a collision, or in a failed scope).
    pub fn is_unresolved(&self, id: TypeId) -> bool {
        let node = self.graph.node(id);
        if node.is_declared() {
            if self.layout.scope_of(id).is_none() {
                return true;
            }
            return matches!(node.kind, TypeKind::Alias(_))
                && matches!(
                    self.graph.node(self.graph.underlying(id)).kind,
                    TypeKind::Unknown
                );
        }
        match &node.kind {
            TypeKind::Unknown => true,
            TypeKind::Record(fields) => {
                node.status == NodeStatus::Collided || fields.iter().any(|f| self.is_unresolved(f.ty))
            }
            TypeKind::Alias(elem) | TypeKind::Pointer(elem) | TypeKind::Slice { elem, .. } => {
                self.is_unresolved(*elem)
            }
            TypeKind::Map { key, value } => self.is_unresolved(*key) || self.is_unresolved(*value),
            TypeKind::Bytes | TypeKind::Primitive(_) | TypeKind::InterfaceLike => false,
        }
    }

    /// Strings, numbers, booleans and their aliases / pointers.
    pub fn is_scalar(&self, id: TypeId) -> bool {
        match &self.graph.node(self.graph.underlying(id)).kind {
            TypeKind::Primitive(Primitive::Mapped(text)) => text != "unknown" && text != "any",
            TypeKind::Primitive(_) | TypeKind::Bytes => true,
            _ => false,
        }
    }

    /// Element type of a slice of scalars.
    pub fn scalar_slice_elem(&self, id: TypeId) -> Option<TypeId> {
        match self.graph.node(self.graph.underlying(id)).kind {
            TypeKind::Slice { elem, .. } if self.is_scalar(elem) => Some(elem),
            _ => None,
        }
    }

    /// Fields of a (non-collided) record, through aliases and pointers.
    pub fn record_fields(&self, id: TypeId) -> Option<&'a [FieldSpec]> {
        let node = self.graph.node(self.graph.underlying(id));
        match &node.kind {
            TypeKind::Record(fields) if node.status == NodeStatus::Ok => Some(fields),
            _ => None,
        }
    }
}

fn render_primitive(primitive: &Primitive) -> TsType {
    match primitive {
        Primitive::String => TsType::STRING,
        Primitive::Number => TsType::Primitive(TsPrimitive::Number),
        Primitive::Boolean => TsType::Primitive(TsPrimitive::Boolean),
        Primitive::Mapped(text) => match text.as_str() {
            "unknown" => TsType::Primitive(TsPrimitive::Unknown),
            "any" => TsType::Primitive(TsPrimitive::Any),
            other => TsType::Ref(other.to_string()),
        },
    }
}
