//! Origin declaration set structs for serde deserialization.
//!
//! This is the contract with the Go parser/type-checker collaborator: an
//! ordered list of packages, each holding struct, named-type and function
//! declarations with fully spelled-out type descriptors.

use serde::Deserialize;

use crate::error::GenerateError;

/// Root of the input: every package handed over by the parser.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclarationSet {
    /// Packages in parser order.
    #[serde(default)]
    pub packages: Vec<PackageDecl>,
}

impl DeclarationSet {
    /// Parse a declaration set from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, GenerateError> {
        serde_json::from_str(json).map_err(GenerateError::InvalidInput)
    }

    /// Total number of declarations across all packages.
    pub fn declaration_count(&self) -> usize {
        self.packages.iter().map(|p| p.declarations.len()).sum()
    }
}

/// One Go package.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageDecl {
    /// Import path, e.g. `example.com/app/models`.
    pub path: String,
    /// Package clause name. Falls back to the last path segment.
    pub name: Option<String>,
    /// Declarations in source order.
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

impl PackageDecl {
    /// The package clause name, or the last segment of the import path.
    pub fn short_name(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Declaration {
    /// `type Name struct { ... }`
    Struct(StructDecl),
    /// `type Name Underlying` for any non-struct underlying type.
    Named(NamedDecl),
    /// `func Name(params) Result`
    Function(FunctionDecl),
}

impl Declaration {
    /// Origin name of the declaration.
    pub fn name(&self) -> &str {
        match self {
            Declaration::Struct(d) => &d.name,
            Declaration::Named(d) => &d.name,
            Declaration::Function(d) => &d.name,
        }
    }

    /// Whether the declaration is visible outside its package.
    pub fn is_exported(&self) -> bool {
        let explicit = match self {
            Declaration::Struct(d) => d.exported,
            Declaration::Named(d) => d.exported,
            Declaration::Function(d) => d.exported,
        };
        explicit.unwrap_or_else(|| is_go_exported(self.name()))
    }
}

/// Go's rule: an identifier is exported if it starts with an uppercase letter.
pub fn is_go_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// A struct type declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct StructDecl {
    /// Type name.
    pub name: String,
    /// Overrides Go's capitalization rule when set.
    pub exported: Option<bool>,
    /// Fields in declaration order, embedded ones included.
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

/// A named non-struct type, e.g. `type UserID uint64`.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedDecl {
    /// Type name.
    pub name: String,
    /// Overrides Go's capitalization rule when set.
    pub exported: Option<bool>,
    /// The type it is defined as.
    pub underlying: TypeExpr,
}

/// A function declaration; only those with transport metadata get a stub.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDecl {
    /// Function name.
    pub name: String,
    /// Overrides Go's capitalization rule when set.
    pub exported: Option<bool>,
    /// Parameters in signature order.
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    /// Response type; absent for endpoints with no response body.
    pub result: Option<TypeExpr>,
    /// Present only for functions exposed as request/response endpoints.
    pub transport: Option<TransportDecl>,
}

/// A function parameter.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamDecl {
    /// Parameter name; also the query key of a scalar parameter.
    pub name: String,
    /// Parameter type.
    #[serde(rename = "type")]
    pub ty: TypeExpr,
}

/// Endpoint metadata attached to a function.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportDecl {
    /// HTTP method. Defaults to GET for query encoding and POST for body.
    pub method: Option<String>,
    /// Path template, e.g. `/api/users/{id}`.
    pub path: String,
    /// Where parameters that are not in the path go.
    #[serde(default)]
    pub encoding: ParamEncoding,
}

/// Where non-path parameters travel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamEncoding {
    /// JSON request payload.
    Body,
    /// Percent-encoded query string.
    #[default]
    Query,
}

/// A struct field.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    /// Field name; for embedded fields, the embedded type's name.
    pub name: String,
    /// Field type.
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    /// Raw struct tag, e.g. `json:"id,omitempty"`.
    #[serde(default)]
    pub tag: String,
    /// Anonymous (embedded) field.
    #[serde(default)]
    pub embedded: bool,
    /// Overrides Go's capitalization rule when set.
    pub exported: Option<bool>,
}

impl FieldDecl {
    /// Whether the field is visible to the JSON encoder.
    pub fn is_exported(&self) -> bool {
        self.exported.unwrap_or_else(|| is_go_exported(&self.name))
    }
}

/// Type descriptor as spelled in the origin source.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeExpr {
    /// Predeclared type: `string`, `bool`, `int64`, `byte`, ...
    Basic {
        /// Go spelling of the type.
        name: String,
    },
    /// Reference to a named type.
    Named {
        /// Import path; defaults to the enclosing package.
        package: Option<String>,
        /// Type name.
        name: String,
    },
    /// `[]T`
    Slice {
        /// Element type.
        elem: Box<TypeExpr>,
    },
    /// `[N]T`
    Array {
        /// Element type.
        elem: Box<TypeExpr>,
        /// Fixed length.
        len: usize,
    },
    /// `map[K]V`
    Map {
        /// Key type.
        key: Box<TypeExpr>,
        /// Value type.
        value: Box<TypeExpr>,
    },
    /// `*T`
    Pointer {
        /// Pointee type.
        elem: Box<TypeExpr>,
    },
    /// Any interface type, including `any` / `interface{}`.
    Interface,
    /// Inline anonymous struct.
    Struct {
        /// Fields in declaration order.
        #[serde(default)]
        fields: Vec<FieldDecl>,
    },
    /// `chan`, `func` and anything else the parser reports.
    #[serde(other)]
    Unsupported,
}
