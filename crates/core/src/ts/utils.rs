//! Identifier and string helpers shared by the emitters.

use std::collections::HashSet;
use std::sync::LazyLock;

/// TypeScript reserved words that cannot be used as identifiers.
pub static TS_RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "break",
        "case",
        "catch",
        "class",
        "const",
        "continue",
        "debugger",
        "default",
        "delete",
        "do",
        "else",
        "enum",
        "export",
        "extends",
        "false",
        "finally",
        "for",
        "function",
        "if",
        "import",
        "in",
        "instanceof",
        "new",
        "null",
        "return",
        "super",
        "switch",
        "this",
        "throw",
        "true",
        "try",
        "typeof",
        "var",
        "void",
        "while",
        "with",
        "yield",
        "let",
        "static",
        "implements",
        "interface",
        "package",
        "private",
        "protected",
        "public",
        "await",
        "async",
    ]
    .into_iter()
    .collect()
});

/// Whether a property name must be quoted (or accessed with brackets).
pub fn needs_bracket_notation(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    let ident_char = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$';
    !(first.is_ascii_alphabetic() || first == '_' || first == '$') || !chars.all(ident_char)
}

/// Escape backslashes and double quotes for a double-quoted string literal.
pub fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Quote a property key if it is not a valid identifier.
pub fn quote_if_needed(name: &str) -> String {
    if needs_bracket_notation(name) {
        format!("\"{}\"", escape_js_string(name))
    } else {
        name.to_string()
    }
}

/// `obj.prop`, `obj?.prop`, `obj["odd-prop"]` or `obj?.["odd-prop"]`.
pub fn format_param_access(obj: &str, prop: &str, nullable: bool) -> String {
    let chain = if nullable { "?." } else { "" };
    if needs_bracket_notation(prop) {
        format!("{obj}{chain}[\"{}\"]", escape_js_string(prop))
    } else if nullable {
        format!("{obj}?.{prop}")
    } else {
        format!("{obj}.{prop}")
    }
}

/// Turn an arbitrary name into a usable TypeScript identifier.
///
/// Characters outside `[A-Za-z0-9_$]` become `_`, a leading digit gets a `_`
/// prefix, and reserved words get a `_` prefix.
pub fn sanitize_ts_identifier(name: &str) -> String {
    let mut result: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '$' { c } else { '_' })
        .collect();

    if result.is_empty() {
        return "_empty".to_string();
    }
    if result.starts_with(|c: char| c.is_ascii_digit()) || TS_RESERVED_WORDS.contains(result.as_str())
    {
        result.insert(0, '_');
    }
    result
}

/// Lower-case the leading run of uppercase letters, keeping the start of the
/// next word: `GetUser` -> `getUser`, `IDLookup` -> `idLookup`, `URL` -> `url`.
pub fn lower_leading_run(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let run = chars.iter().take_while(|c| c.is_uppercase()).count();
    let cut = if run > 1 && chars.get(run).is_some_and(|c| c.is_lowercase()) {
        run - 1
    } else {
        run
    };
    chars
        .iter()
        .enumerate()
        .flat_map(|(i, c)| {
            let lowered: Vec<char> = if i < cut {
                c.to_lowercase().collect()
            } else {
                vec![*c]
            };
            lowered
        })
        .collect()
}

/// Convert a string to snake_case (for comparison purposes).
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Indent every non-empty line by `levels` steps of two spaces.
pub fn indent_lines(code: &str, levels: usize) -> String {
    let prefix = "  ".repeat(levels);
    let mut output = String::with_capacity(code.len());
    for line in code.lines() {
        if !line.is_empty() {
            output.push_str(&prefix);
            output.push_str(line);
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_bracket_notation() {
        assert!(!needs_bracket_notation("foo"));
        assert!(!needs_bracket_notation("_foo"));
        assert!(!needs_bracket_notation("$foo"));
        assert!(!needs_bracket_notation("UpdatedAt"));

        assert!(needs_bracket_notation(""));
        assert!(needs_bracket_notation("-"));
        assert!(needs_bracket_notation("123foo"));
        assert!(needs_bracket_notation("foo-bar"));
        assert!(needs_bracket_notation("foo bar"));
    }

    #[test]
    fn test_quote_if_needed() {
        assert_eq!(quote_if_needed("foo"), "foo");
        assert_eq!(quote_if_needed("created-at"), "\"created-at\"");
        assert_eq!(quote_if_needed("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn test_format_param_access() {
        assert_eq!(format_param_access("filter", "limit", false), "filter.limit");
        assert_eq!(format_param_access("filter", "limit", true), "filter?.limit");
        assert_eq!(
            format_param_access("filter", "page-size", false),
            "filter[\"page-size\"]"
        );
        assert_eq!(
            format_param_access("filter", "page-size", true),
            "filter?.[\"page-size\"]"
        );
    }

    #[test]
    fn test_sanitize_ts_identifier() {
        assert_eq!(sanitize_ts_identifier("models"), "models");
        assert_eq!(sanitize_ts_identifier("go-redis"), "go_redis");
        assert_eq!(sanitize_ts_identifier("2fa"), "_2fa");
        assert_eq!(sanitize_ts_identifier("delete"), "_delete");
        assert_eq!(sanitize_ts_identifier("package"), "_package");
        assert_eq!(sanitize_ts_identifier(""), "_empty");
    }

    #[test]
    fn test_lower_leading_run() {
        assert_eq!(lower_leading_run("GetUser"), "getUser");
        assert_eq!(lower_leading_run("IDLookup"), "idLookup");
        assert_eq!(lower_leading_run("URL"), "url");
        assert_eq!(lower_leading_run("List"), "list");
        assert_eq!(lower_leading_run("already"), "already");
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("userId"), "user_id");
        assert_eq!(to_snake_case("UserID"), "user_i_d");
        assert_eq!(to_snake_case("id"), "id");
    }

    #[test]
    fn test_indent_lines() {
        assert_eq!(indent_lines("a\n\nb\n", 1), "  a\n\n  b\n");
    }
}
