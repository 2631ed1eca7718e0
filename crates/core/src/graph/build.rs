//! Declaration set -> type graph.
//!
//! Pass one registers every exported named declaration so forward, self and
//! mutual references resolve to a single id. Pass two fills in node kinds,
//! flattening embedded structs into their containers, and collects endpoint
//! functions.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::tags::{self, Directives};
use super::{
    FieldSpec, FunctionSpec, Identity, PackageInfo, Primitive, Transport, TypeGraph, TypeId,
    TypeKind,
};
use crate::config::{EmbeddedFields, GeneratorConfig};
use crate::decl::{Declaration, DeclarationSet, FieldDecl, FunctionDecl, TypeExpr};
use crate::error::{DiagnosticKind, Diagnostics};

/// Build the type graph for a declaration set.
pub fn build(set: &DeclarationSet, config: &GeneratorConfig, diagnostics: &mut Diagnostics) -> TypeGraph {
    let mut builder = Builder {
        config,
        graph: TypeGraph::default(),
        diagnostics,
        structs: HashMap::new(),
        package: String::new(),
        declaration: String::new(),
    };
    builder.run(set);
    let graph = builder.graph;
    debug!(
        nodes = graph.len(),
        functions = graph.functions.len(),
        packages = graph.packages.len(),
        "type graph built"
    );
    graph
}

struct Builder<'a, 'd> {
    config: &'a GeneratorConfig,
    graph: TypeGraph,
    diagnostics: &'d mut Diagnostics,
    /// Fields of every struct-like declaration, exported or not, for embedding.
    structs: HashMap<Identity, &'a [FieldDecl]>,
    /// Declaration currently being built, for diagnostics.
    package: String,
    declaration: String,
}

/// A registered declaration waiting for its kind.
struct Pending<'a> {
    id: TypeId,
    identity: Identity,
    declaration: &'a Declaration,
}

impl<'a> Builder<'a, '_> {
    fn run(&mut self, set: &'a DeclarationSet) {
        let mut pending = Vec::new();
        let mut functions: Vec<(&'a str, &'a FunctionDecl)> = Vec::new();
        let mut seen_functions = HashSet::new();

        // Pass one: register.
        for package in &set.packages {
            if !self.graph.packages.iter().any(|p| p.path == package.path) {
                self.graph.packages.push(PackageInfo {
                    path: package.path.clone(),
                    short_name: package.short_name().to_string(),
                });
            }

            for declaration in &package.declarations {
                let identity = Identity::new(&package.path, declaration.name());

                if let Some(fields) = struct_fields(declaration) {
                    self.structs.entry(identity.clone()).or_insert(fields);
                }
                if !declaration.is_exported() {
                    continue;
                }

                match declaration {
                    Declaration::Function(function) => {
                        if seen_functions.insert(identity.clone()) {
                            functions.push((package.path.as_str(), function));
                        } else {
                            debug!(%identity, "duplicate function declaration ignored");
                        }
                    }
                    Declaration::Struct(_) | Declaration::Named(_) => {
                        if self.graph.lookup(&identity).is_some() {
                            debug!(%identity, "duplicate type declaration ignored");
                            continue;
                        }
                        let id = self.graph.intern_named(identity.clone(), TypeKind::Unknown, true);
                        pending.push(Pending {
                            id,
                            identity,
                            declaration,
                        });
                    }
                }
            }
        }

        // Pass two: fill kinds.
        for Pending {
            id,
            identity,
            declaration,
        } in pending
        {
            self.enter(&identity.package, &identity.name);
            let kind = match (declaration, struct_fields(declaration)) {
                (_, Some(fields)) => TypeKind::Record(self.flatten(&identity.package, fields, Some(&identity))),
                (Declaration::Named(named), None) => {
                    TypeKind::Alias(self.type_expr(&identity.package, &named.underlying))
                }
                _ => TypeKind::Unknown,
            };
            self.graph.node_mut(id).kind = kind;
        }

        for (package, function) in functions {
            self.function(package, function);
        }
    }

    fn enter(&mut self, package: &str, declaration: &str) {
        self.package = package.to_string();
        self.declaration = declaration.to_string();
    }

    fn report(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.diagnostics
            .report(kind, &self.package, &self.declaration, message);
    }

    fn unresolvable(&mut self, message: impl Into<String>) -> TypeId {
        self.report(DiagnosticKind::UnresolvableType, message);
        self.graph.unknown()
    }

    fn function(&mut self, package: &str, function: &'a FunctionDecl) {
        let Some(transport) = &function.transport else {
            debug!(package, function = %function.name, "function without transport metadata skipped");
            return;
        };
        self.enter(package, &function.name);

        let params = function
            .params
            .iter()
            .map(|p| (p.name.clone(), self.type_expr(package, &p.ty)))
            .collect();
        let result = function.result.as_ref().map(|r| self.type_expr(package, r));

        self.graph.functions.push(FunctionSpec {
            identity: Identity::new(package, &function.name),
            destination_name: String::new(),
            params,
            result,
            transport: Transport {
                method: transport.method.clone(),
                path_template: transport.path.clone(),
                encoding: transport.encoding,
            },
        });
    }

    // =========================================================================
    // Type expressions
    // =========================================================================

    fn type_expr(&mut self, package: &str, expr: &'a TypeExpr) -> TypeId {
        match expr {
            TypeExpr::Basic { name } => self.basic(name),
            TypeExpr::Named { package: pkg, name } => {
                let identity = Identity::new(pkg.as_deref().unwrap_or(package), name);
                self.named(identity)
            }
            TypeExpr::Slice { elem } => {
                if matches!(&**elem, TypeExpr::Basic { name } if name == "byte" || name == "uint8") {
                    self.graph.bytes()
                } else {
                    let elem = self.type_expr(package, elem);
                    self.graph.slice(elem, None)
                }
            }
            TypeExpr::Array { elem, len } => {
                let elem = self.type_expr(package, elem);
                self.graph.slice(elem, Some(*len))
            }
            TypeExpr::Map { key, value } => {
                let key = self.type_expr(package, key);
                let value = self.type_expr(package, value);
                self.graph.map(key, value)
            }
            TypeExpr::Pointer { elem } => {
                let elem = self.type_expr(package, elem);
                self.graph.pointer(elem)
            }
            TypeExpr::Interface => self.graph.interface_like(),
            TypeExpr::Struct { fields } => {
                let fields = self.flatten(package, fields, None);
                self.graph.push_anonymous_record(fields)
            }
            TypeExpr::Unsupported => {
                self.unresolvable("channel, function and other non-data types have no JSON form")
            }
        }
    }

    fn basic(&mut self, name: &str) -> TypeId {
        let primitive = match name {
            "string" => Primitive::String,
            "bool" => Primitive::Boolean,
            "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16"
            | "uint32" | "uint64" | "uintptr" | "float32" | "float64" | "byte" | "rune" => {
                Primitive::Number
            }
            "any" | "error" => return self.graph.interface_like(),
            "complex64" | "complex128" => {
                return self.unresolvable(format!("`{name}` has no JSON form"));
            }
            _ => return self.unresolvable(format!("unknown basic type `{name}`")),
        };
        self.graph.primitive(primitive)
    }

    fn named(&mut self, identity: Identity) -> TypeId {
        if let Some(id) = self.graph.lookup(&identity) {
            return id;
        }

        if let Some(destination) = self.config.known_type_for(&identity.to_string()) {
            let primitive = match destination {
                "string" => Primitive::String,
                "number" => Primitive::Number,
                "boolean" => Primitive::Boolean,
                other => Primitive::Mapped(other.to_string()),
            };
            return self
                .graph
                .intern_named(identity, TypeKind::Primitive(primitive), false);
        }

        let message = if self.structs.contains_key(&identity) || is_lowercase_start(&identity.name) {
            format!("`{identity}` is not exported")
        } else {
            format!("`{identity}` is not in the declaration set")
        };
        self.report(DiagnosticKind::UnresolvableType, message);
        self.graph.intern_named(identity, TypeKind::Unknown, false)
    }

    // =========================================================================
    // Fields
    // =========================================================================

    fn flatten(
        &mut self,
        package: &str,
        fields: &'a [FieldDecl],
        container: Option<&Identity>,
    ) -> Vec<FieldSpec> {
        let mut out = Vec::new();
        let mut visiting: Vec<Identity> = container.into_iter().cloned().collect();
        self.collect_fields(package, fields, 0, &mut visiting, &mut out);
        for (ordinal, field) in out.iter_mut().enumerate() {
            field.ordinal = ordinal;
        }
        out
    }

    fn collect_fields(
        &mut self,
        package: &str,
        fields: &'a [FieldDecl],
        depth: usize,
        visiting: &mut Vec<Identity>,
        out: &mut Vec<FieldSpec>,
    ) {
        for field in fields {
            let directives = match tags::parse_field_tag(
                &field.tag,
                &self.config.tag_key,
                &self.config.hint_tag_key,
            ) {
                Ok(directives) => directives,
                Err(err) => {
                    self.report(
                        DiagnosticKind::MalformedTag,
                        format!("field `{}`: {err}", field.name),
                    );
                    Directives::default()
                }
            };
            if directives.is_skipped() {
                continue;
            }

            if field.embedded && directives.rename().is_none() {
                if let Some(identity) = self.promotable(package, &field.ty) {
                    if visiting.contains(&identity) {
                        debug!(%identity, "embedding cycle cut");
                        continue;
                    }
                    if let Some(embedded) = self.structs.get(&identity).copied() {
                        let embedded_package = identity.package.clone();
                        visiting.push(identity);
                        self.collect_fields(&embedded_package, embedded, depth + 1, visiting, out);
                        visiting.pop();
                        continue;
                    }
                }
            }

            if !field.is_exported() {
                continue;
            }

            out.push(FieldSpec {
                declared_name: field.name.clone(),
                destination_name: String::new(),
                ty: self.type_expr(package, &field.ty),
                optional: false,
                nullable: false,
                as_string: false,
                ordinal: 0,
                directives,
                depth,
            });
        }
    }

    /// Identity of an embedded struct whose fields should be promoted.
    fn promotable(&self, package: &str, ty: &TypeExpr) -> Option<Identity> {
        if self.config.embedded_fields == EmbeddedFields::Nested {
            return None;
        }
        let target = match ty {
            TypeExpr::Pointer { elem } => &**elem,
            other => other,
        };
        let TypeExpr::Named { package: pkg, name } = target else {
            return None;
        };
        let identity = Identity::new(pkg.as_deref().unwrap_or(package), name);
        self.structs.contains_key(&identity).then_some(identity)
    }
}

fn struct_fields(declaration: &Declaration) -> Option<&[FieldDecl]> {
    match declaration {
        Declaration::Struct(s) => Some(&s.fields),
        Declaration::Named(n) => match &n.underlying {
            TypeExpr::Struct { fields } => Some(fields),
            _ => None,
        },
        Declaration::Function(_) => None,
    }
}

fn is_lowercase_start(name: &str) -> bool {
    !crate::decl::is_go_exported(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;

    fn build_json(json: &str, config: &GeneratorConfig) -> (TypeGraph, Diagnostics) {
        let set = DeclarationSet::from_json(json).unwrap();
        let mut diagnostics = Diagnostics::default();
        let graph = build(&set, config, &mut diagnostics);
        (graph, diagnostics)
    }

    fn record_fields<'g>(graph: &'g TypeGraph, package: &str, name: &str) -> &'g [FieldSpec] {
        let id = graph.lookup(&Identity::new(package, name)).unwrap();
        match &graph.node(id).kind {
            TypeKind::Record(fields) => fields,
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn test_self_reference_is_one_node() {
        let json = r#"{ "packages": [ { "path": "p", "declarations": [
            { "kind": "struct", "name": "Node", "fields": [
                { "name": "Next", "type": { "kind": "pointer", "elem": { "kind": "named", "name": "Node" } } }
            ] }
        ] } ] }"#;
        let (graph, diagnostics) = build_json(json, &GeneratorConfig::default());
        let node = graph.lookup(&Identity::new("p", "Node")).unwrap();
        let fields = record_fields(&graph, "p", "Node");
        assert!(matches!(graph.node(fields[0].ty).kind, TypeKind::Pointer(target) if target == node));
        assert_eq!(diagnostics.iter().count(), 0);
    }

    #[test]
    fn test_embedded_fields_are_promoted() {
        let json = r#"{ "packages": [ { "path": "p", "declarations": [
            { "kind": "struct", "name": "base", "fields": [
                { "name": "ID", "type": { "kind": "basic", "name": "int64" } },
                { "name": "secret", "type": { "kind": "basic", "name": "string" } }
            ] },
            { "kind": "struct", "name": "User", "fields": [
                { "name": "base", "type": { "kind": "pointer", "elem": { "kind": "named", "name": "base" } }, "embedded": true },
                { "name": "Name", "type": { "kind": "basic", "name": "string" } }
            ] }
        ] } ] }"#;
        let (graph, _) = build_json(json, &GeneratorConfig::default());
        let fields = record_fields(&graph, "p", "User");
        let names: Vec<_> = fields.iter().map(|f| (f.declared_name.as_str(), f.depth, f.ordinal)).collect();
        assert_eq!(names, vec![("ID", 1, 0), ("Name", 0, 1)]);
        assert!(graph.lookup(&Identity::new("p", "base")).is_none());
    }

    #[test]
    fn test_nested_embedding_keeps_field() {
        let json = r#"{ "packages": [ { "path": "p", "declarations": [
            { "kind": "struct", "name": "Base", "fields": [
                { "name": "ID", "type": { "kind": "basic", "name": "int64" } }
            ] },
            { "kind": "struct", "name": "User", "fields": [
                { "name": "Base", "type": { "kind": "named", "name": "Base" }, "embedded": true }
            ] }
        ] } ] }"#;
        let config = GeneratorConfig::default().embedded_fields(EmbeddedFields::Nested);
        let (graph, _) = build_json(json, &config);
        let fields = record_fields(&graph, "p", "User");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].declared_name, "Base");
        assert_eq!(Some(fields[0].ty), graph.lookup(&Identity::new("p", "Base")));
    }

    #[test]
    fn test_embedding_cycle_is_cut() {
        let json = r#"{ "packages": [ { "path": "p", "declarations": [
            { "kind": "struct", "name": "A", "fields": [
                { "name": "B", "type": { "kind": "pointer", "elem": { "kind": "named", "name": "B" } }, "embedded": true },
                { "name": "X", "type": { "kind": "basic", "name": "string" } }
            ] },
            { "kind": "struct", "name": "B", "fields": [
                { "name": "A", "type": { "kind": "pointer", "elem": { "kind": "named", "name": "A" } }, "embedded": true },
                { "name": "Y", "type": { "kind": "basic", "name": "string" } }
            ] }
        ] } ] }"#;
        let (graph, _) = build_json(json, &GeneratorConfig::default());
        let names: Vec<_> = record_fields(&graph, "p", "A")
            .iter()
            .map(|f| f.declared_name.as_str())
            .collect();
        assert_eq!(names, vec!["Y", "X"]);
    }

    #[test]
    fn test_unresolved_reference_reported_once() {
        let json = r#"{ "packages": [ { "path": "p", "declarations": [
            { "kind": "struct", "name": "A", "fields": [
                { "name": "X", "type": { "kind": "named", "package": "q", "name": "Missing" } },
                { "name": "Y", "type": { "kind": "named", "package": "q", "name": "Missing" } },
                { "name": "C", "type": { "kind": "chan" } },
                { "name": "Z", "type": { "kind": "basic", "name": "complex128" } }
            ] }
        ] } ] }"#;
        let (graph, diagnostics) = build_json(json, &GeneratorConfig::default());
        let fields = record_fields(&graph, "p", "A");
        assert_eq!(fields[0].ty, fields[1].ty);
        assert!(matches!(graph.node(fields[2].ty).kind, TypeKind::Unknown));
        let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::UnresolvableType; 3]);
        assert!(diagnostics.iter().next().unwrap().message.contains("q.Missing"));
    }

    #[test]
    fn test_known_types_and_bytes() {
        let json = r#"{ "packages": [ { "path": "p", "declarations": [
            { "kind": "struct", "name": "A", "fields": [
                { "name": "At", "type": { "kind": "named", "package": "time", "name": "Time" } },
                { "name": "Raw", "type": { "kind": "slice", "elem": { "kind": "basic", "name": "byte" } } }
            ] }
        ] } ] }"#;
        let (graph, diagnostics) = build_json(json, &GeneratorConfig::default());
        let fields = record_fields(&graph, "p", "A");
        assert!(matches!(
            graph.node(fields[0].ty).kind,
            TypeKind::Primitive(Primitive::String)
        ));
        assert!(matches!(graph.node(fields[1].ty).kind, TypeKind::Bytes));
        assert_eq!(diagnostics.iter().count(), 0);
    }

    #[test]
    fn test_duplicate_declaration_first_wins() {
        let json = r#"{ "packages": [ { "path": "p", "declarations": [
            { "kind": "named", "name": "ID", "underlying": { "kind": "basic", "name": "string" } },
            { "kind": "named", "name": "ID", "underlying": { "kind": "basic", "name": "int" } }
        ] } ] }"#;
        let (graph, _) = build_json(json, &GeneratorConfig::default());
        let id = graph.lookup(&Identity::new("p", "ID")).unwrap();
        let TypeKind::Alias(target) = graph.node(id).kind else {
            panic!("expected alias");
        };
        assert!(matches!(
            graph.node(target).kind,
            TypeKind::Primitive(Primitive::String)
        ));
        assert_eq!(graph.declared().count(), 1);
    }

    #[test]
    fn test_functions_need_transport() {
        let json = r#"{ "packages": [ { "path": "p", "declarations": [
            { "kind": "function", "name": "Helper" },
            { "kind": "function", "name": "internal", "transport": { "path": "/x" } },
            { "kind": "function", "name": "Ping", "transport": { "path": "/ping" } }
        ] } ] }"#;
        let (graph, _) = build_json(json, &GeneratorConfig::default());
        assert_eq!(graph.functions.len(), 1);
        assert_eq!(graph.functions[0].identity.name, "Ping");
    }

    #[test]
    fn test_malformed_tag_keeps_declared_name() {
        let json = r#"{ "packages": [ { "path": "p", "declarations": [
            { "kind": "struct", "name": "A", "fields": [
                { "name": "X", "type": { "kind": "basic", "name": "string" }, "tag": "json:\"x" }
            ] }
        ] } ] }"#;
        let (graph, diagnostics) = build_json(json, &GeneratorConfig::default());
        let fields = record_fields(&graph, "p", "A");
        assert_eq!(fields[0].directives, Directives::default());
        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::MalformedTag);
        assert_eq!(diagnostic.declaration, "A");
    }
}
