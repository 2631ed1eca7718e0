//! TypeScript AST for the generated unit.
//!
//! - `TsType`: type expressions (primitives, arrays, unions, objects, maps)
//! - `TsTypeDef`: top-level `export interface` / `export type` declarations
//! - `TsExpr` / `TsStmt` / `TsFunction`: just enough to express call stubs

/// TypeScript type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsType {
    Primitive(TsPrimitive),
    /// `T[]`
    Array(Box<TsType>),
    /// `A | B | C`
    Union(Vec<TsType>),
    /// `{ foo: string; bar?: number }`
    Object(Vec<TsProp>),
    /// `Map<K, V>`
    Map { key: Box<TsType>, value: Box<TsType> },
    /// `{ [key: K]: V }`
    IndexSignature { key: Box<TsType>, value: Box<TsType> },
    /// `Promise<T>`
    Promise(Box<TsType>),
    /// Named reference, possibly namespace-qualified: `User`, `models.User`
    Ref(String),
}

/// TypeScript primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsPrimitive {
    String,
    Number,
    Boolean,
    Null,
    Void,
    Unknown,
    Any,
}

impl TsType {
    pub const STRING: TsType = TsType::Primitive(TsPrimitive::String);
    pub const NULL: TsType = TsType::Primitive(TsPrimitive::Null);

    /// `self | null`, flattening unions and never repeating `null`.
    pub fn or_null(self) -> TsType {
        match self {
            TsType::Union(mut members) => {
                if !members.contains(&TsType::NULL) {
                    members.push(TsType::NULL);
                }
                TsType::Union(members)
            }
            TsType::Primitive(TsPrimitive::Null) => TsType::NULL,
            other => TsType::Union(vec![other, TsType::NULL]),
        }
    }
}

/// Object property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsProp {
    pub name: String,
    pub ty: TsType,
    pub optional: bool,
}

/// Kind of a top-level type declaration.
#[derive(Debug, Clone)]
pub enum TypeDefKind {
    /// `export interface Foo { ... }`
    Interface { properties: Vec<TsProp> },
    /// `export type Foo = { ... };`
    ObjectAlias { properties: Vec<TsProp> },
    /// `export type Foo = T;`
    TypeAlias { ty: TsType },
}

/// Top-level type declaration.
#[derive(Debug, Clone)]
pub struct TsTypeDef {
    pub name: String,
    pub kind: TypeDefKind,
}

/// Expression.
#[derive(Debug, Clone)]
pub enum TsExpr {
    Ident(String),
    /// `"text"`
    Str(String),
    /// `foo(a, b)`
    Call { callee: Box<TsExpr>, args: Vec<TsExpr> },
    /// `{ a: 1, b: 2 }`
    Object(Vec<(String, TsExpr)>),
    /// `` `${foo}/bar` ``
    Template(Vec<TemplatePart>),
    /// `await fetch()`
    Await(Box<TsExpr>),
    /// `cond ? a : b`
    Ternary {
        cond: Box<TsExpr>,
        then_expr: Box<TsExpr>,
        else_expr: Box<TsExpr>,
    },
    /// `expr as Type`
    Cast { expr: Box<TsExpr>, ty: TsType },
    /// `(expr)`
    Paren(Box<TsExpr>),
    /// Code that doesn't fit the AST.
    Raw(String),
}

/// Template literal part.
#[derive(Debug, Clone)]
pub enum TemplatePart {
    Static(String),
    /// `${expr}`
    Dynamic(TsExpr),
}

/// Function parameter.
#[derive(Debug, Clone)]
pub struct TsParam {
    pub name: String,
    pub ty: TsType,
}

/// Statement in a function body.
#[derive(Debug, Clone)]
pub enum TsStmt {
    /// `const name = init;`
    Const { name: String, ty: Option<TsType>, init: TsExpr },
    /// `expr;`
    Expr(TsExpr),
    /// `return expr;`
    Return(TsExpr),
    /// Raw multi-line code, indented line by line.
    Raw(String),
}

/// Exported async arrow function: `export const name = async (...): R => { ... };`
#[derive(Debug, Clone)]
pub struct TsFunction {
    pub name: String,
    pub params: Vec<TsParam>,
    pub return_type: TsType,
    pub body: Vec<TsStmt>,
}
