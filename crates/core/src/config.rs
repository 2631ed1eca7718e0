//! Generator configuration.
//!
//! Every option affects exactly one pipeline stage. The struct deserializes
//! from TOML with camelCase keys and kebab-case values:
//!
//! ```toml
//! declarationForm = "alias"
//! mapRepresentation = "index-signature"
//! namespaceGrouping = "on"
//!
//! [typeRenames]
//! "example.com/app/models.User" = "SystemUser"
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::GenerateError;

/// How records are declared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclarationForm {
    /// `export interface User { ... }`
    #[default]
    Interface,
    /// `export type User = { ... };`
    Alias,
}

/// How Go maps are rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MapRepresentation {
    /// `Map<K, V> | null`
    #[default]
    KeyedType,
    /// `{ [key: K]: V } | null`
    IndexSignature,
}

/// Whether each package gets its own `export namespace` block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamespaceGrouping {
    /// One namespace per Go package, named after its package clause.
    On,
    /// Everything in one flattened scope.
    #[default]
    Off,
}

/// What unresolvable and interface-like types render as.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnresolvedTypeFallback {
    /// `unknown`
    #[default]
    UnknownMarker,
    /// `any`
    EscapeMarker,
}

/// Order of properties inside a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldOrdering {
    /// Origin declaration order (the order Go marshals fields in).
    #[default]
    DeclarationOrder,
    /// Destination name, case-sensitive.
    Lexical,
}

/// Key type for maps keyed by a named alias of a non-string primitive
/// (`map[UserID]bool` with `type UserID uint64`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MapKeyAliases {
    /// Keep the alias name: `Map<UserID, boolean>`.
    #[default]
    Preserve,
    /// Use `string`, matching the JSON object key: `Map<string, boolean>`.
    CoerceString,
}

/// Treatment of embedded (anonymous) struct fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddedFields {
    /// Promote the embedded struct's fields into the container.
    #[default]
    Flatten,
    /// Keep the embedded struct as a field named after its type.
    Nested,
}

/// Configuration for a generation run.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub(crate) declaration_form: DeclarationForm,
    pub(crate) map_representation: MapRepresentation,
    pub(crate) namespace_grouping: NamespaceGrouping,
    pub(crate) unresolved_type_fallback: UnresolvedTypeFallback,
    pub(crate) field_ordering: FieldOrdering,
    pub(crate) map_key_aliases: MapKeyAliases,
    pub(crate) embedded_fields: EmbeddedFields,
    /// Struct tag key carrying serialization names.
    pub(crate) tag_key: String,
    /// Struct tag key carrying `nullable` / `optional` hints.
    pub(crate) hint_tag_key: String,
    /// Whether to start the output with a generated-code header.
    pub(crate) emit_header: bool,
    /// `"<package path>.<Name>"` -> destination name.
    pub(crate) type_renames: BTreeMap<String, String>,
    /// `"<package path>.<Name>"` -> TypeScript type for types outside the input.
    pub(crate) known_types: BTreeMap<String, String>,
}

/// Well-known external types and how they marshal to JSON.
pub const DEFAULT_KNOWN_TYPES: &[(&str, &str)] = &[
    ("time.Time", "string"),
    ("time.Duration", "number"),
    ("encoding/json.RawMessage", "unknown"),
    ("encoding/json.Number", "string"),
];

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            declaration_form: DeclarationForm::default(),
            map_representation: MapRepresentation::default(),
            namespace_grouping: NamespaceGrouping::default(),
            unresolved_type_fallback: UnresolvedTypeFallback::default(),
            field_ordering: FieldOrdering::default(),
            map_key_aliases: MapKeyAliases::default(),
            embedded_fields: EmbeddedFields::default(),
            tag_key: "json".to_string(),
            hint_tag_key: "ts".to_string(),
            emit_header: true,
            type_renames: BTreeMap::new(),
            known_types: BTreeMap::new(),
        }
    }
}

impl GeneratorConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML configuration file.
    pub fn from_toml_str(source: &str) -> Result<Self, GenerateError> {
        toml::from_str(source).map_err(GenerateError::InvalidConfig)
    }

    /// Interface or object-alias form for records.
    pub fn declaration_form(mut self, value: DeclarationForm) -> Self {
        self.declaration_form = value;
        self
    }

    /// `Map<K, V>` or an index signature for Go maps.
    pub fn map_representation(mut self, value: MapRepresentation) -> Self {
        self.map_representation = value;
        self
    }

    /// Group declarations per package.
    pub fn namespace_grouping(mut self, value: NamespaceGrouping) -> Self {
        self.namespace_grouping = value;
        self
    }

    /// `unknown` or `any` for types that cannot be resolved.
    pub fn unresolved_type_fallback(mut self, value: UnresolvedTypeFallback) -> Self {
        self.unresolved_type_fallback = value;
        self
    }

    /// Declaration or lexical order for record properties.
    pub fn field_ordering(mut self, value: FieldOrdering) -> Self {
        self.field_ordering = value;
        self
    }

    /// Keep or coerce aliased non-string map keys.
    pub fn map_key_aliases(mut self, value: MapKeyAliases) -> Self {
        self.map_key_aliases = value;
        self
    }

    /// Flatten or nest embedded structs.
    pub fn embedded_fields(mut self, value: EmbeddedFields) -> Self {
        self.embedded_fields = value;
        self
    }

    /// Struct tag key carrying serialization names.
    pub fn tag_key(mut self, value: impl Into<String>) -> Self {
        self.tag_key = value.into();
        self
    }

    /// Struct tag key carrying `nullable` / `optional` hints.
    pub fn hint_tag_key(mut self, value: impl Into<String>) -> Self {
        self.hint_tag_key = value.into();
        self
    }

    /// Start the output with the generated-code header.
    pub fn emit_header(mut self, value: bool) -> Self {
        self.emit_header = value;
        self
    }

    /// Rename the type `<package path>.<Name>` in the output.
    pub fn rename_type(mut self, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        self.type_renames.insert(origin.into(), destination.into());
        self
    }

    /// Map an external type `<package path>.<Name>` to a TypeScript type.
    pub fn known_type(mut self, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        self.known_types.insert(origin.into(), destination.into());
        self
    }

    /// Whether namespace grouping is on.
    pub fn is_grouped(&self) -> bool {
        self.namespace_grouping == NamespaceGrouping::On
    }

    /// Destination for a well-known external type; configured entries win.
    pub(crate) fn known_type_for(&self, identity: &str) -> Option<&str> {
        self.known_types.get(identity).map(String::as_str).or_else(|| {
            DEFAULT_KNOWN_TYPES
                .iter()
                .find(|(origin, _)| *origin == identity)
                .map(|(_, destination)| *destination)
        })
    }
}
