//! Call stub generation.
//!
//! Every endpoint function becomes an exported async arrow function that
//! builds the URL, issues one `fetch` and casts the decoded JSON response.
//! Shapes that can't be expressed (unknown method, a second body parameter,
//! a record in the path, ...) skip the stub with an *unsupported transport*
//! diagnostic; the rest of the scope still emits.

use std::collections::HashSet;

use thiserror::Error;

use crate::decl::ParamEncoding;
use crate::error::{DiagnosticKind, Diagnostics};
use crate::graph::{FunctionSpec, TypeId, TypeKind};
use crate::translate::Translator;
use crate::ts::utils::{format_param_access, lower_leading_run, sanitize_ts_identifier, to_snake_case};
use crate::ts::{Emit, TemplatePart, TsExpr, TsFunction, TsParam, TsPrimitive, TsStmt, TsType};

const ALLOWED_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Globals called from every stub body.
const CALLED_GLOBALS: &[&str] = &["fetch", "encodeURIComponent", "String", "JSON"];

/// Locals a stub body may declare.
const BODY_LOCALS: &[&str] = &["query", "queryString", "url", "res"];

/// Why an endpoint has no stub.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnsupportedShape {
    #[error("method `{0}` is not one of GET, POST, PUT, PATCH, DELETE")]
    Method(String),

    #[error("body encoding cannot be sent with GET")]
    BodyWithGet,

    #[error("{count} parameters left for the request body ({names}), expected at most one")]
    TooManyBodyParams { count: usize, names: String },

    #[error("path template `{0}` has an unclosed `{{`")]
    UnclosedPlaceholder(String),

    #[error("path placeholder `{{{0}}}` has no matching parameter")]
    MissingPathParam(String),

    #[error("path parameter `{0}` is not a string, number or boolean")]
    NonScalarPath(String),

    #[error("query parameter `{0}` is not a scalar, a slice of scalars or a record of those")]
    NonScalarQuery(String),

    #[error("field `{field}` of query parameter `{param}` is not a scalar or a slice of scalars")]
    NonScalarQueryField { param: String, field: String },

    #[error("parameter `{0}` has an unresolvable type")]
    UnresolvedParam(String),

    #[error("result type is unresolvable")]
    UnresolvedResult,
}

/// Piece of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPart {
    Static(String),
    /// `{name}`
    Placeholder(String),
}

/// One `[key, value]` pair of the query string.
#[derive(Debug)]
struct QueryEntry {
    key: String,
    /// TypeScript expression for the value.
    value: String,
    /// Slice: one entry per element.
    repeated: bool,
}

/// Build the stub for one endpoint, or report why it can't be built.
pub fn emit_stub(
    function: &FunctionSpec,
    translator: &Translator<'_>,
    diagnostics: &mut Diagnostics,
) -> Option<TsFunction> {
    match build_stub(function, translator) {
        Ok(stub) => Some(stub),
        Err(reason) => {
            diagnostics.report(
                DiagnosticKind::UnsupportedTransport,
                &function.identity.package,
                &function.identity.name,
                reason.to_string(),
            );
            None
        }
    }
}

fn build_stub(function: &FunctionSpec, translator: &Translator<'_>) -> Result<TsFunction, UnsupportedShape> {
    let transport = &function.transport;
    let encoding = transport.encoding;

    let method = match &transport.method {
        Some(method) => {
            let upper = method.to_ascii_uppercase();
            if !ALLOWED_METHODS.contains(&upper.as_str()) {
                return Err(UnsupportedShape::Method(method.clone()));
            }
            upper
        }
        None => match encoding {
            ParamEncoding::Body => "POST".to_string(),
            ParamEncoding::Query => "GET".to_string(),
        },
    };
    if method == "GET" && encoding == ParamEncoding::Body {
        return Err(UnsupportedShape::BodyWithGet);
    }

    for (name, ty) in &function.params {
        if translator.is_unresolved(*ty) {
            return Err(UnsupportedShape::UnresolvedParam(name.clone()));
        }
    }
    if function.result.is_some_and(|r| translator.is_unresolved(r)) {
        return Err(UnsupportedShape::UnresolvedResult);
    }

    let idents = param_idents(&function.params);

    // Path
    let mut used = vec![false; function.params.len()];
    let mut path_parts = Vec::new();
    for part in parse_path_template(&transport.path_template)? {
        match part {
            PathPart::Static(text) => path_parts.push(TemplatePart::Static(text)),
            PathPart::Placeholder(placeholder) => {
                let index = find_matching_param(&placeholder, &function.params)
                    .ok_or_else(|| UnsupportedShape::MissingPathParam(placeholder.clone()))?;
                let (name, ty) = &function.params[index];
                if !translator.is_scalar(*ty) {
                    return Err(UnsupportedShape::NonScalarPath(name.clone()));
                }
                used[index] = true;
                path_parts.push(TemplatePart::Dynamic(TsExpr::Raw(format!(
                    "encodeURIComponent(String({}))",
                    idents[index]
                ))));
            }
        }
    }
    let has_placeholders = path_parts
        .iter()
        .any(|p| matches!(p, TemplatePart::Dynamic(_)));
    let path_expr = if has_placeholders {
        TsExpr::Template(path_parts.clone())
    } else {
        TsExpr::Str(transport.path_template.clone())
    };

    let remaining: Vec<usize> = (0..function.params.len()).filter(|i| !used[*i]).collect();
    let mut body = Vec::new();
    let mut url = path_expr.clone();
    let mut payload = None;

    match encoding {
        ParamEncoding::Query => {
            let entries = query_entries(function, &idents, &remaining, translator)?;
            if !entries.is_empty() {
                body.push(TsStmt::Raw(query_array(&entries)));
                body.push(TsStmt::Raw(QUERY_STRING.to_string()));

                let mut with_query = if has_placeholders {
                    path_parts
                } else {
                    vec![TemplatePart::Static(transport.path_template.clone())]
                };
                with_query.push(TemplatePart::Static("?".into()));
                with_query.push(TemplatePart::Dynamic(TsExpr::Ident("queryString".into())));
                body.push(TsStmt::Const {
                    name: "url".into(),
                    ty: None,
                    init: TsExpr::Ternary {
                        cond: Box::new(TsExpr::Ident("queryString".into())),
                        then_expr: Box::new(TsExpr::Template(with_query)),
                        else_expr: Box::new(path_expr),
                    },
                });
                url = TsExpr::Ident("url".into());
            }
        }
        ParamEncoding::Body => {
            if remaining.len() > 1 {
                let names: Vec<_> = remaining
                    .iter()
                    .map(|i| function.params[*i].0.as_str())
                    .collect();
                return Err(UnsupportedShape::TooManyBodyParams {
                    count: remaining.len(),
                    names: names.join(", "),
                });
            }
            payload = remaining.first().map(|i| idents[*i].clone());
        }
    }

    let mut init = vec![("method".to_string(), TsExpr::Str(method))];
    if let Some(payload) = payload {
        init.push((
            "headers".to_string(),
            TsExpr::Object(vec![(
                "Content-Type".to_string(),
                TsExpr::Str("application/json".into()),
            )]),
        ));
        init.push((
            "body".to_string(),
            TsExpr::Call {
                callee: Box::new(TsExpr::Ident("JSON.stringify".into())),
                args: vec![TsExpr::Ident(payload)],
            },
        ));
    }
    let fetch = TsExpr::Await(Box::new(TsExpr::Call {
        callee: Box::new(TsExpr::Ident("fetch".into())),
        args: vec![url, TsExpr::Object(init)],
    }));

    let return_type = match function.result {
        Some(result) => {
            let ty = translator.render(result);
            body.push(TsStmt::Const {
                name: "res".into(),
                ty: None,
                init: fetch,
            });
            body.push(TsStmt::Return(TsExpr::Cast {
                expr: Box::new(TsExpr::Paren(Box::new(TsExpr::Await(Box::new(TsExpr::Call {
                    callee: Box::new(TsExpr::Ident("res.json".into())),
                    args: vec![],
                }))))),
                ty: ty.clone(),
            }));
            ty
        }
        None => {
            body.push(TsStmt::Expr(fetch));
            TsType::Primitive(TsPrimitive::Void)
        }
    };

    let params = function
        .params
        .iter()
        .zip(&idents)
        .map(|((_, ty), ident)| TsParam {
            name: ident.clone(),
            ty: translator.render(*ty),
        })
        .collect();

    Ok(TsFunction {
        name: function.destination_name.clone(),
        params,
        return_type: TsType::Promise(Box::new(return_type)),
        body,
    })
}

/// Exported stub name: `GetUser` -> `getUser`, never one of the globals the
/// body calls.
pub fn stub_name(function_name: &str) -> String {
    let name = sanitize_ts_identifier(&lower_leading_run(function_name));
    if CALLED_GLOBALS.contains(&name.as_str()) {
        format!("{name}_")
    } else {
        name
    }
}

/// Distinct parameter identifiers that shadow nothing the body uses.
fn param_idents(params: &[(String, TypeId)]) -> Vec<String> {
    let mut taken = HashSet::new();
    params
        .iter()
        .map(|(name, _)| {
            let mut base = sanitize_ts_identifier(name);
            if BODY_LOCALS.contains(&base.as_str()) || CALLED_GLOBALS.contains(&base.as_str()) {
                base.push('_');
            }
            let mut ident = base.clone();
            let mut suffix = 2;
            while !taken.insert(ident.clone()) {
                ident = format!("{base}{suffix}");
                suffix += 1;
            }
            ident
        })
        .collect()
}

const QUERY_STRING: &str = r#"const queryString = query
  .filter(([, value]) => value !== null && value !== undefined)
  .map(([key, value]) => `${encodeURIComponent(key)}=${encodeURIComponent(String(value))}`)
  .join("&");"#;

fn query_array(entries: &[QueryEntry]) -> String {
    let mut code = "const query: [string, unknown][] = [\n".to_string();
    for entry in entries {
        let key = TsExpr::Str(entry.key.clone()).emit();
        if entry.repeated {
            code.push_str(&format!(
                "  ...({} ?? []).map((v): [string, unknown] => [{key}, v]),\n",
                entry.value
            ));
        } else {
            code.push_str(&format!("  [{key}, {}],\n", entry.value));
        }
    }
    code.push_str("];");
    code
}

fn query_entries(
    function: &FunctionSpec,
    idents: &[String],
    remaining: &[usize],
    translator: &Translator<'_>,
) -> Result<Vec<QueryEntry>, UnsupportedShape> {
    let mut entries = Vec::new();

    for index in remaining {
        let (name, ty) = &function.params[*index];
        let ident = &idents[*index];
        let key = if name.is_empty() { ident.clone() } else { name.clone() };

        if translator.is_scalar(*ty) {
            entries.push(QueryEntry {
                key,
                value: ident.clone(),
                repeated: false,
            });
        } else if translator.scalar_slice_elem(*ty).is_some() {
            entries.push(QueryEntry {
                key,
                value: ident.clone(),
                repeated: true,
            });
        } else if let Some(fields) = translator.record_fields(*ty) {
            let nullable = matches!(translator.graph().node(*ty).kind, TypeKind::Pointer(_));
            for field in fields {
                let value = format_param_access(ident, &field.destination_name, nullable);
                let repeated = if translator.is_scalar(field.ty) {
                    false
                } else if translator.scalar_slice_elem(field.ty).is_some() {
                    true
                } else {
                    return Err(UnsupportedShape::NonScalarQueryField {
                        param: name.clone(),
                        field: field.destination_name.clone(),
                    });
                };
                entries.push(QueryEntry {
                    key: field.destination_name.clone(),
                    value,
                    repeated,
                });
            }
        } else {
            return Err(UnsupportedShape::NonScalarQuery(name.clone()));
        }
    }

    entries.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(entries)
}

fn parse_path_template(path: &str) -> Result<Vec<PathPart>, UnsupportedShape> {
    let mut parts = Vec::new();
    let mut rest = path;
    while let Some(open) = rest.find('{') {
        if open > 0 {
            parts.push(PathPart::Static(rest[..open].to_string()));
        }
        let Some(close) = rest[open..].find('}') else {
            return Err(UnsupportedShape::UnclosedPlaceholder(path.to_string()));
        };
        parts.push(PathPart::Placeholder(rest[open + 1..open + close].to_string()));
        rest = &rest[open + close + 1..];
    }
    if !rest.is_empty() {
        parts.push(PathPart::Static(rest.to_string()));
    }
    Ok(parts)
}

/// Exact name first, then snake_case equivalence (`userId` matches `{user_id}`).
fn find_matching_param(placeholder: &str, params: &[(String, TypeId)]) -> Option<usize> {
    if let Some(index) = params.iter().position(|(name, _)| name == placeholder) {
        return Some(index);
    }
    let placeholder_snake = to_snake_case(placeholder);
    params
        .iter()
        .position(|(name, _)| to_snake_case(name) == placeholder_snake)
}
