//! Name & tag resolution.
//!
//! Gives every field, declared type and endpoint its destination name, and
//! applies Go's promotion dominance: among fields sharing a destination name
//! the shallowest embedding depth wins, and a tie at that depth is a
//! collision that takes the whole record out of the output.

use std::collections::BTreeMap;

use tracing::debug;

use super::{FieldSpec, NodeStatus, TypeGraph, TypeId, TypeKind};
use crate::config::GeneratorConfig;
use crate::error::{DiagnosticKind, Diagnostics};
use crate::stubs::stub_name;

pub fn resolve(graph: &mut TypeGraph, config: &GeneratorConfig, diagnostics: &mut Diagnostics) {
    let records: Vec<TypeId> = graph.nodes().filter(|n| n.is_record()).map(|n| n.id).collect();
    for id in records {
        resolve_record(graph, id, diagnostics);
    }

    let declared: Vec<TypeId> = graph.declared().map(|n| n.id).collect();
    for id in declared {
        let node = graph.node_mut(id);
        let Some(identity) = node.identity() else {
            continue;
        };
        let destination = config
            .type_renames
            .get(&identity.to_string())
            .cloned()
            .unwrap_or_else(|| identity.name.clone());
        node.destination_name = destination;
    }

    for function in &mut graph.functions {
        function.destination_name = stub_name(&function.identity.name);
    }

    let collided = graph
        .nodes()
        .filter(|n| n.status == NodeStatus::Collided)
        .count();
    debug!(collided, "names resolved");
}

fn resolve_record(graph: &mut TypeGraph, id: TypeId, diagnostics: &mut Diagnostics) {
    let (package, declaration) = match graph.node(id).identity() {
        Some(identity) => (identity.package.clone(), identity.name.clone()),
        None => (String::new(), "<inline struct>".to_string()),
    };

    let node = graph.node_mut(id);
    let TypeKind::Record(fields) = &mut node.kind else {
        return;
    };

    for field in &mut *fields {
        field.destination_name = field
            .directives
            .rename()
            .unwrap_or(&field.declared_name)
            .to_string();
    }

    // destination name -> (shallowest depth, fields at that depth)
    let mut shallowest: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for field in &*fields {
        let entry = shallowest
            .entry(field.destination_name.as_str())
            .or_insert((field.depth, 0));
        if field.depth < entry.0 {
            *entry = (field.depth, 1);
        } else if field.depth == entry.0 {
            entry.1 += 1;
        }
    }

    let mut collisions = Vec::new();
    for (name, (depth, count)) in &shallowest {
        if *count > 1 {
            collisions.push(format!(
                "`{name}` is claimed by {count} fields at embedding depth {depth}"
            ));
        }
    }
    let keep: Vec<bool> = fields
        .iter()
        .map(|f| shallowest.get(f.destination_name.as_str()).map(|(depth, _)| *depth) == Some(f.depth))
        .collect();
    drop(shallowest);

    let mut index = 0;
    fields.retain(|_| {
        let kept = keep[index];
        index += 1;
        kept
    });

    if !collisions.is_empty() {
        node.status = NodeStatus::Collided;
        for message in collisions {
            diagnostics.report(DiagnosticKind::NameCollision, &package, &declaration, message);
        }
    }
}

/// Fields in the order they should be printed.
pub fn ordered_fields(fields: &[FieldSpec], lexical: bool) -> Vec<&FieldSpec> {
    let mut ordered: Vec<&FieldSpec> = fields.iter().collect();
    if lexical {
        ordered.sort_by(|a, b| a.destination_name.cmp(&b.destination_name));
    } else {
        ordered.sort_by_key(|f| f.ordinal);
    }
    ordered
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::decl::DeclarationSet;
    use crate::graph::{Identity, build};

    fn resolved(json: &str, config: &GeneratorConfig) -> (TypeGraph, Diagnostics) {
        let set = DeclarationSet::from_json(json).unwrap();
        let mut diagnostics = Diagnostics::default();
        let mut graph = build(&set, config, &mut diagnostics);
        resolve(&mut graph, config, &mut diagnostics);
        (graph, diagnostics)
    }

    fn field_names(graph: &TypeGraph, name: &str) -> Vec<String> {
        let id = graph.lookup(&Identity::new("p", name)).unwrap();
        let TypeKind::Record(fields) = &graph.node(id).kind else {
            panic!("expected record");
        };
        fields.iter().map(|f| f.destination_name.clone()).collect()
    }

    const EMBEDDING: &str = r#"{ "packages": [ { "path": "p", "declarations": [
        { "kind": "struct", "name": "Audit", "fields": [
            { "name": "UpdatedAt", "type": { "kind": "basic", "name": "string" } },
            { "name": "ID", "type": { "kind": "basic", "name": "string" } }
        ] },
        { "kind": "struct", "name": "Meta", "fields": [
            { "name": "Version", "type": { "kind": "basic", "name": "int" } }
        ] },
        { "kind": "struct", "name": "Other", "fields": [
            { "name": "Version", "type": { "kind": "basic", "name": "string" } }
        ] },
        { "kind": "struct", "name": "Group", "fields": [
            { "name": "Name", "type": { "kind": "basic", "name": "string" }, "tag": "json:\"groupName\"" },
            { "name": "Audit", "type": { "kind": "named", "name": "Audit" }, "embedded": true },
            { "name": "ID", "type": { "kind": "basic", "name": "int64" }, "tag": "json:\"ID\"" }
        ] },
        { "kind": "struct", "name": "Broken", "fields": [
            { "name": "Meta", "type": { "kind": "named", "name": "Meta" }, "embedded": true },
            { "name": "Other", "type": { "kind": "named", "name": "Other" }, "embedded": true }
        ] }
    ] } ] }"#;

    #[test]
    fn test_rename_and_shallowest_wins() {
        let (graph, diagnostics) = resolved(EMBEDDING, &GeneratorConfig::default());
        assert_eq!(field_names(&graph, "Group"), vec!["groupName", "UpdatedAt", "ID"]);

        let group = graph.lookup(&Identity::new("p", "Group")).unwrap();
        assert_eq!(graph.node(group).status, NodeStatus::Ok);
        assert!(diagnostics
            .iter()
            .all(|d| d.declaration != "Group"));
    }

    #[test]
    fn test_tie_at_same_depth_is_collision() {
        let (graph, diagnostics) = resolved(EMBEDDING, &GeneratorConfig::default());
        let broken = graph.lookup(&Identity::new("p", "Broken")).unwrap();
        assert_eq!(graph.node(broken).status, NodeStatus::Collided);

        let diagnostic = diagnostics
            .iter()
            .find(|d| d.declaration == "Broken")
            .unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::NameCollision);
        assert!(diagnostic.message.contains("`Version`"));
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn test_direct_fields_with_same_name_collide() {
        let json = r#"{ "packages": [ { "path": "p", "declarations": [
            { "kind": "struct", "name": "Dup", "fields": [
                { "name": "A", "type": { "kind": "basic", "name": "string" }, "tag": "json:\"x\"" },
                { "name": "B", "type": { "kind": "basic", "name": "string" }, "tag": "json:\"x\"" }
            ] }
        ] } ] }"#;
        let (graph, _) = resolved(json, &GeneratorConfig::default());
        let dup = graph.lookup(&Identity::new("p", "Dup")).unwrap();
        assert_eq!(graph.node(dup).status, NodeStatus::Collided);
    }

    #[test]
    fn test_type_renames_and_stub_names() {
        let json = r#"{ "packages": [ { "path": "p", "declarations": [
            { "kind": "struct", "name": "User" },
            { "kind": "function", "name": "IDLookup", "transport": { "path": "/id" } },
            { "kind": "function", "name": "Delete", "transport": { "path": "/del", "method": "DELETE" } }
        ] } ] }"#;
        let config = GeneratorConfig::default().rename_type("p.User", "SystemUser");
        let (graph, _) = resolved(json, &config);
        let user = graph.lookup(&Identity::new("p", "User")).unwrap();
        assert_eq!(graph.node(user).destination_name, "SystemUser");

        let names: Vec<_> = graph
            .functions
            .iter()
            .map(|f| f.destination_name.as_str())
            .collect();
        assert_eq!(names, vec!["idLookup", "_delete"]);
    }

    #[test]
    fn test_ordered_fields() {
        let (graph, _) = resolved(EMBEDDING, &GeneratorConfig::default());
        let group = graph.lookup(&Identity::new("p", "Group")).unwrap();
        let TypeKind::Record(fields) = &graph.node(group).kind else {
            panic!("expected record");
        };
        let lexical: Vec<_> = ordered_fields(fields, true)
            .iter()
            .map(|f| f.destination_name.as_str())
            .collect();
        assert_eq!(lexical, vec!["ID", "UpdatedAt", "groupName"]);
    }
}
