//! Declaration emission: aliases, then records, per scope.

use crate::config::DeclarationForm;
use crate::namespace::NamespaceSpec;
use crate::translate::Translator;
use crate::ts::{TsType, TsTypeDef, TypeDefKind};

/// Type declarations of a scope in output order.
pub fn emit_declarations(
    scope: &NamespaceSpec,
    translator: &Translator<'_>,
    form: DeclarationForm,
) -> Vec<TsTypeDef> {
    let graph = translator.graph();
    let aliases = scope.aliases.iter().map(|id| TsTypeDef {
        name: graph.node(*id).destination_name.clone(),
        kind: TypeDefKind::TypeAlias {
            ty: translator.render_definition(*id),
        },
    });

    let records = scope.records.iter().map(|id| {
        let properties = match translator.render_definition(*id) {
            TsType::Object(properties) => properties,
            _ => Vec::new(),
        };
        let kind = match form {
            DeclarationForm::Interface => TypeDefKind::Interface { properties },
            DeclarationForm::Alias => TypeDefKind::ObjectAlias { properties },
        };
        TsTypeDef {
            name: graph.node(*id).destination_name.clone(),
            kind,
        }
    });

    aliases.chain(records).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::decl::DeclarationSet;
    use crate::error::Diagnostics;
    use crate::graph::{build, classify, resolve};
    use crate::namespace::group;
    use crate::ts::Emit;

    fn emit(json: &str, config: &GeneratorConfig) -> String {
        let set = DeclarationSet::from_json(json).unwrap();
        let mut diagnostics = Diagnostics::default();
        let mut graph = build(&set, config, &mut diagnostics);
        resolve(&mut graph, config, &mut diagnostics);
        classify(&mut graph);
        let layout = group(&graph, config, &mut diagnostics);
        let translator = Translator::new(&graph, &layout, config, Some(0));
        emit_declarations(&layout.scopes[0], &translator, config.declaration_form)
            .iter()
            .map(Emit::emit)
            .collect::<Vec<_>>()
            .join("\n")
    }

    const INPUT: &str = r#"{ "packages": [ { "path": "p", "declarations": [
        { "kind": "struct", "name": "Thing", "fields": [
            { "name": "Data", "type": { "kind": "slice", "elem": { "kind": "named", "name": "User" } } }
        ] },
        { "kind": "named", "name": "foobar", "exported": true, "underlying": { "kind": "basic", "name": "int" } },
        { "kind": "struct", "name": "User", "fields": [
            { "name": "ID", "type": { "kind": "named", "name": "foobar" }, "tag": "json:\"userID\"" }
        ] },
        { "kind": "named", "name": "Labels", "underlying": { "kind": "map",
            "key": { "kind": "basic", "name": "string" }, "value": { "kind": "basic", "name": "string" } } }
    ] } ] }"#;

    #[test]
    fn test_aliases_then_records_sorted() {
        let ts_code = emit(INPUT, &GeneratorConfig::default());
        let expected = "\
export type Labels = Map<string, string> | null;

export type foobar = number;

export interface Thing {
  Data: User[] | null;
}

export interface User {
  userID: foobar;
}
";
        assert_eq!(ts_code, expected);
    }

    #[test]
    fn test_alias_declaration_form() {
        let config = GeneratorConfig::default().declaration_form(DeclarationForm::Alias);
        let ts_code = emit(INPUT, &config);
        assert!(
            ts_code.contains("export type User = {\n  userID: foobar;\n};\n"),
            "Should emit closed object alias, got:\n{ts_code}"
        );
        assert!(!ts_code.contains("interface"), "No interfaces in alias form");
    }
}
