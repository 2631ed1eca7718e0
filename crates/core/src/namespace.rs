//! Namespace grouping.
//!
//! With grouping on, every Go package becomes one `export namespace` scope
//! named after its package clause. With grouping off, everything lands in a
//! single flattened scope. Either way a scope in which two type declarations
//! (or two stubs) share a destination name fails as a whole.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::config::GeneratorConfig;
use crate::error::{DiagnosticKind, Diagnostics};
use crate::graph::{NodeStatus, TypeGraph, TypeId, TypeKind};
use crate::ts::utils::sanitize_ts_identifier;

/// Scope name used in diagnostics for the flattened scope.
const ROOT_SCOPE: &str = "<root>";

/// One output scope.
#[derive(Debug, Clone, Default)]
pub struct NamespaceSpec {
    /// Namespace identifier; empty for the flattened scope.
    pub name: String,
    /// Import paths of the packages folded into this scope.
    pub packages: Vec<String>,
    /// Named non-record types, sorted by destination name.
    pub aliases: Vec<TypeId>,
    /// Records, sorted by destination name.
    pub records: Vec<TypeId>,
    /// Indices into `TypeGraph::functions`, sorted by destination name.
    pub functions: Vec<usize>,
}

impl NamespaceSpec {
    fn label(&self) -> &str {
        if self.name.is_empty() { ROOT_SCOPE } else { &self.name }
    }
}

/// Which scope every emitted declaration lives in.
#[derive(Debug, Default)]
pub struct Layout {
    pub grouped: bool,
    /// Surviving scopes, sorted by name.
    pub scopes: Vec<NamespaceSpec>,
    placement: HashMap<TypeId, usize>,
}

impl Layout {
    /// Index of the scope declaring `id`, if it is emitted at all.
    pub fn scope_of(&self, id: TypeId) -> Option<usize> {
        self.placement.get(&id).copied()
    }
}

pub fn group(graph: &TypeGraph, config: &GeneratorConfig, diagnostics: &mut Diagnostics) -> Layout {
    let grouped = config.is_grouped();

    let mut packages: Vec<_> = graph.packages.iter().collect();
    packages.sort_by(|a, b| a.path.cmp(&b.path));

    // package path -> scope
    let mut scopes: Vec<NamespaceSpec> = Vec::new();
    let mut scope_by_package: HashMap<&str, usize> = HashMap::new();
    if grouped {
        let mut taken: HashMap<String, &str> = HashMap::new();
        for package in packages {
            let name = sanitize_ts_identifier(&package.short_name);
            if let Some(owner) = taken.get(&name) {
                diagnostics.report(
                    DiagnosticKind::NameCollision,
                    &package.path,
                    &name,
                    format!("namespace `{name}` is already used by package `{owner}`"),
                );
                continue;
            }
            taken.insert(name.clone(), &package.path);
            scope_by_package.insert(&package.path, scopes.len());
            scopes.push(NamespaceSpec {
                name,
                packages: vec![package.path.clone()],
                ..NamespaceSpec::default()
            });
        }
    } else {
        scopes.push(NamespaceSpec {
            packages: packages.iter().map(|p| p.path.clone()).collect(),
            ..NamespaceSpec::default()
        });
        for package in &graph.packages {
            scope_by_package.insert(&package.path, 0);
        }
    }

    for node in graph.declared() {
        if node.status == NodeStatus::Collided {
            continue;
        }
        let Some(identity) = node.identity() else {
            continue;
        };
        let Some(&index) = scope_by_package.get(identity.package.as_str()) else {
            continue;
        };
        match node.kind {
            TypeKind::Record(_) => scopes[index].records.push(node.id),
            _ => scopes[index].aliases.push(node.id),
        }
    }
    for (index, function) in graph.functions.iter().enumerate() {
        if let Some(&scope) = scope_by_package.get(function.identity.package.as_str()) {
            scopes[scope].functions.push(index);
        }
    }

    let by_name = |ids: &mut Vec<TypeId>| {
        ids.sort_by(|a, b| {
            graph
                .node(*a)
                .destination_name
                .cmp(&graph.node(*b).destination_name)
        });
    };
    for scope in &mut scopes {
        by_name(&mut scope.aliases);
        by_name(&mut scope.records);
        scope.functions.sort_by(|a, b| {
            graph.functions[*a]
                .destination_name
                .cmp(&graph.functions[*b].destination_name)
        });
    }

    scopes.retain(|scope| check_scope(graph, scope, diagnostics));
    scopes.sort_by(|a, b| a.name.cmp(&b.name));

    let mut placement = HashMap::new();
    for (index, scope) in scopes.iter().enumerate() {
        for id in scope.aliases.iter().chain(&scope.records) {
            placement.insert(*id, index);
        }
    }

    debug!(
        scopes = scopes.len(),
        declarations = placement.len(),
        grouped,
        "namespaces grouped"
    );

    Layout {
        grouped,
        scopes,
        placement,
    }
}

/// Report top-level collisions; `false` drops the scope.
fn check_scope(graph: &TypeGraph, scope: &NamespaceSpec, diagnostics: &mut Diagnostics) -> bool {
    let mut types: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for id in scope.aliases.iter().chain(&scope.records) {
        let node = graph.node(*id);
        let origin = node.identity().map(ToString::to_string).unwrap_or_default();
        types.entry(node.destination_name.as_str()).or_default().push(origin);
    }

    let mut stubs: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for index in &scope.functions {
        let function = &graph.functions[*index];
        stubs
            .entry(function.destination_name.as_str())
            .or_default()
            .push(function.identity.to_string());
    }

    let package = if scope.name.is_empty() {
        String::new()
    } else {
        scope.packages.join(",")
    };
    let mut ok = true;
    for (what, table) in [("type", &types), ("stub", &stubs)] {
        for (name, origins) in table {
            if origins.len() > 1 {
                ok = false;
                diagnostics.report(
                    DiagnosticKind::NameCollision,
                    &package,
                    scope.label(),
                    format!("{what} `{name}` is declared by {}", origins.join(" and ")),
                );
            }
        }
    }
    ok
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::NamespaceGrouping;
    use crate::decl::DeclarationSet;
    use crate::graph::{Identity, build, classify, resolve};

    fn layout(json: &str, config: &GeneratorConfig) -> (TypeGraph, Layout, Diagnostics) {
        let set = DeclarationSet::from_json(json).unwrap();
        let mut diagnostics = Diagnostics::default();
        let mut graph = build(&set, config, &mut diagnostics);
        resolve(&mut graph, config, &mut diagnostics);
        classify(&mut graph);
        let layout = group(&graph, config, &mut diagnostics);
        (graph, layout, diagnostics)
    }

    const TWO_PACKAGES: &str = r#"{ "packages": [
        { "path": "example.com/app/models", "declarations": [
            { "kind": "struct", "name": "User" },
            { "kind": "named", "name": "UserID", "underlying": { "kind": "basic", "name": "int" } },
            { "kind": "struct", "name": "Group" }
        ] },
        { "path": "example.com/app/api", "declarations": [
            { "kind": "struct", "name": "User" }
        ] }
    ] }"#;

    #[test]
    fn test_grouped_scopes_sorted() {
        let config = GeneratorConfig::default().namespace_grouping(NamespaceGrouping::On);
        let (graph, layout, diagnostics) = layout(TWO_PACKAGES, &config);
        assert!(!diagnostics.has_errors());
        let names: Vec<_> = layout.scopes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["api", "models"]);

        let models = &layout.scopes[1];
        let records: Vec<_> = models
            .records
            .iter()
            .map(|id| graph.node(*id).destination_name.as_str())
            .collect();
        assert_eq!(records, vec!["Group", "User"]);
        assert_eq!(models.aliases.len(), 1);

        let api_user = graph
            .lookup(&Identity::new("example.com/app/api", "User"))
            .unwrap();
        assert_eq!(layout.scope_of(api_user), Some(0));
    }

    #[test]
    fn test_flattened_duplicate_fails_scope() {
        let (_, layout, diagnostics) = layout(TWO_PACKAGES, &GeneratorConfig::default());
        assert!(layout.scopes.is_empty());
        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::NameCollision);
        assert_eq!(diagnostic.declaration, "<root>");
        assert!(diagnostic.message.contains("example.com/app/api.User"));
        assert!(diagnostic.message.contains("example.com/app/models.User"));
    }

    #[test]
    fn test_rename_resolves_flattened_duplicate() {
        let config = GeneratorConfig::default().rename_type("example.com/app/api.User", "ApiUser");
        let (_, layout, diagnostics) = layout(TWO_PACKAGES, &config);
        assert!(!diagnostics.has_errors());
        assert_eq!(layout.scopes.len(), 1);
        assert_eq!(layout.scopes[0].records.len(), 3);
    }

    #[test]
    fn test_duplicate_namespace_fails_later_package() {
        let json = r#"{ "packages": [
            { "path": "example.com/b/util", "declarations": [ { "kind": "struct", "name": "B" } ] },
            { "path": "example.com/a/util", "declarations": [ { "kind": "struct", "name": "A" } ] }
        ] }"#;
        let config = GeneratorConfig::default().namespace_grouping(NamespaceGrouping::On);
        let (graph, layout, diagnostics) = layout(json, &config);
        assert_eq!(layout.scopes.len(), 1);
        assert_eq!(layout.scopes[0].packages, vec!["example.com/a/util".to_string()]);

        let b = graph.lookup(&Identity::new("example.com/b/util", "B")).unwrap();
        assert_eq!(layout.scope_of(b), None);
        assert_eq!(diagnostics.iter().next().unwrap().package, "example.com/b/util");
    }
}
