//! Optionality classification.
//!
//! `nullable` and `optional` are independent: a pointer (or `ts:"nullable"`)
//! can hold `null`, while `omitempty` / `omitzero` (or `ts:"optional"`) lets
//! the key disappear from the JSON object.

use tracing::debug;

use super::tags::Directive;
use super::{FieldSpec, Primitive, TypeGraph, TypeId, TypeKind};

pub fn classify(graph: &mut TypeGraph) {
    let records: Vec<TypeId> = graph.nodes().filter(|n| n.is_record()).map(|n| n.id).collect();
    let mut classified = 0;

    for id in records {
        let flags: Vec<(bool, bool, bool)> = match &graph.node(id).kind {
            TypeKind::Record(fields) => fields.iter().map(|f| field_flags(graph, f)).collect(),
            _ => continue,
        };
        if let TypeKind::Record(fields) = &mut graph.node_mut(id).kind {
            for (field, (nullable, optional, as_string)) in fields.iter_mut().zip(flags) {
                field.nullable = nullable;
                field.optional = optional;
                field.as_string = as_string;
                classified += 1;
            }
        }
    }

    debug!(fields = classified, "optionality classified");
}

/// `(nullable, optional, as_string)`
fn field_flags(graph: &TypeGraph, field: &FieldSpec) -> (bool, bool, bool) {
    let directives = &field.directives;
    let nullable = matches!(graph.node(field.ty).kind, TypeKind::Pointer(_))
        || directives.has(&Directive::Nullable);
    let optional = directives.has(&Directive::OmitEmpty) || directives.has(&Directive::Optional);
    let as_string = directives.has(&Directive::AsString)
        && matches!(
            graph.node(graph.underlying(field.ty)).kind,
            TypeKind::Primitive(Primitive::Number | Primitive::Boolean)
        );
    (nullable, optional, as_string)
}
