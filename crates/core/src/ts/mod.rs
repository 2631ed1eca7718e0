//! TypeScript AST and printer.
//!
//! - `types`: the AST (TsType, TsTypeDef, TsExpr, TsStmt, TsFunction)
//! - `emit`: AST to code strings via the `Emit` trait
//! - `utils`: identifier quoting and sanitizing helpers

mod emit;
mod types;
pub mod utils;

pub use emit::Emit;
pub use types::{
    TemplatePart, TsExpr, TsFunction, TsParam, TsPrimitive, TsProp, TsStmt, TsType, TsTypeDef,
    TypeDefKind,
};
