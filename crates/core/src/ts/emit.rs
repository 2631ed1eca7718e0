//! TypeScript code emission via the Emit trait.
//!
//! Each AST node knows how to print itself; layout (blank lines between
//! declarations, namespace indentation) is left to the caller.

use super::types::{
    TemplatePart, TsExpr, TsFunction, TsParam, TsPrimitive, TsProp, TsStmt, TsType, TsTypeDef,
    TypeDefKind,
};
use super::utils::{escape_js_string, indent_lines, quote_if_needed};

/// Trait for emitting TypeScript code from AST nodes.
pub trait Emit {
    /// Convert the AST node to its TypeScript string representation.
    fn emit(&self) -> String;
}

// =============================================================================
// Types
// =============================================================================

impl Emit for TsPrimitive {
    fn emit(&self) -> String {
        match self {
            TsPrimitive::String => "string",
            TsPrimitive::Number => "number",
            TsPrimitive::Boolean => "boolean",
            TsPrimitive::Null => "null",
            TsPrimitive::Void => "void",
            TsPrimitive::Unknown => "unknown",
            TsPrimitive::Any => "any",
        }
        .to_string()
    }
}

impl Emit for TsType {
    fn emit(&self) -> String {
        match self {
            TsType::Primitive(p) => p.emit(),
            TsType::Array(inner) => {
                if matches!(**inner, TsType::Union(_)) {
                    format!("({})[]", inner.emit())
                } else {
                    format!("{}[]", inner.emit())
                }
            }
            TsType::Union(members) => members.iter().map(Emit::emit).collect::<Vec<_>>().join(" | "),
            TsType::Object(props) => {
                if props.is_empty() {
                    "{}".to_string()
                } else {
                    let parts: Vec<_> = props.iter().map(Emit::emit).collect();
                    format!("{{ {} }}", parts.join("; "))
                }
            }
            TsType::Map { key, value } => format!("Map<{}, {}>", key.emit(), value.emit()),
            TsType::IndexSignature { key, value } => {
                format!("{{ [key: {}]: {} }}", key.emit(), value.emit())
            }
            TsType::Promise(inner) => format!("Promise<{}>", inner.emit()),
            TsType::Ref(name) => name.clone(),
        }
    }
}

impl Emit for TsProp {
    fn emit(&self) -> String {
        let opt = if self.optional { "?" } else { "" };
        format!("{}{opt}: {}", quote_if_needed(&self.name), self.ty.emit())
    }
}

// =============================================================================
// Type Definitions
// =============================================================================

fn emit_property_block(properties: &[TsProp]) -> String {
    if properties.is_empty() {
        return "{}".to_string();
    }
    let mut output = "{\n".to_string();
    for prop in properties {
        output.push_str("  ");
        output.push_str(&prop.emit());
        output.push_str(";\n");
    }
    output.push('}');
    output
}

impl Emit for TsTypeDef {
    fn emit(&self) -> String {
        match &self.kind {
            TypeDefKind::Interface { properties } => {
                format!("export interface {} {}\n", self.name, emit_property_block(properties))
            }
            TypeDefKind::ObjectAlias { properties } => {
                format!("export type {} = {};\n", self.name, emit_property_block(properties))
            }
            TypeDefKind::TypeAlias { ty } => {
                format!("export type {} = {};\n", self.name, ty.emit())
            }
        }
    }
}

// =============================================================================
// Expressions
// =============================================================================

impl Emit for TsExpr {
    fn emit(&self) -> String {
        match self {
            TsExpr::Ident(name) => name.clone(),
            TsExpr::Str(s) => format!("\"{}\"", escape_js_string(s)),
            TsExpr::Call { callee, args } => {
                let args_str = args.iter().map(Emit::emit).collect::<Vec<_>>().join(", ");
                format!("{}({args_str})", callee.emit())
            }
            TsExpr::Object(props) => {
                if props.is_empty() {
                    "{}".to_string()
                } else {
                    let parts: Vec<_> = props
                        .iter()
                        .map(|(k, v)| format!("{}: {}", quote_if_needed(k), v.emit()))
                        .collect();
                    format!("{{ {} }}", parts.join(", "))
                }
            }
            TsExpr::Template(parts) => {
                let content: String = parts
                    .iter()
                    .map(|p| match p {
                        TemplatePart::Static(s) => s
                            .replace('\\', "\\\\")
                            .replace('`', "\\`")
                            .replace("${", "\\${"),
                        TemplatePart::Dynamic(e) => format!("${{{}}}", e.emit()),
                    })
                    .collect();
                format!("`{content}`")
            }
            TsExpr::Await(expr) => format!("await {}", expr.emit()),
            TsExpr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => format!("{} ? {} : {}", cond.emit(), then_expr.emit(), else_expr.emit()),
            TsExpr::Cast { expr, ty } => format!("{} as {}", expr.emit(), ty.emit()),
            TsExpr::Paren(expr) => format!("({})", expr.emit()),
            TsExpr::Raw(code) => code.clone(),
        }
    }
}

impl Emit for TsParam {
    fn emit(&self) -> String {
        format!("{}: {}", self.name, self.ty.emit())
    }
}

// =============================================================================
// Statements
// =============================================================================

impl TsStmt {
    /// Emit with specified indentation level (2 spaces per level).
    pub fn emit_indented(&self, indent: usize) -> String {
        let prefix = "  ".repeat(indent);
        match self {
            TsStmt::Const { name, ty, init } => {
                let ty_str = ty.as_ref().map(|t| format!(": {}", t.emit())).unwrap_or_default();
                format!("{prefix}const {name}{ty_str} = {};\n", init.emit())
            }
            TsStmt::Expr(expr) => format!("{prefix}{};\n", expr.emit()),
            TsStmt::Return(expr) => format!("{prefix}return {};\n", expr.emit()),
            TsStmt::Raw(code) => indent_lines(code, indent),
        }
    }
}

impl Emit for TsStmt {
    fn emit(&self) -> String {
        self.emit_indented(1)
    }
}

// =============================================================================
// Functions
// =============================================================================

impl Emit for TsFunction {
    fn emit(&self) -> String {
        let params_str = self.params.iter().map(Emit::emit).collect::<Vec<_>>().join(", ");
        let mut output = format!(
            "export const {} = async ({params_str}): {} =>",
            self.name,
            self.return_type.emit()
        );
        if self.body.is_empty() {
            output.push_str(" {};\n");
        } else {
            output.push_str(" {\n");
            for stmt in &self.body {
                output.push_str(&stmt.emit_indented(1));
            }
            output.push_str("};\n");
        }
        output
    }
}

// =============================================================================
// Tests
// =============================================================================
