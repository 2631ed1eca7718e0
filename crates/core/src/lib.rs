//! Go type declarations to TypeScript.
//!
//! Takes a declaration set produced by a Go parser (structs with `json` tags,
//! named types, endpoint functions) and emits one TypeScript source unit with
//! matching type declarations and `fetch` call stubs.
//!
//! ## Module Structure
//!
//! - `decl`: input contract (serde)
//! - `config`: generator options (TOML + builder)
//! - `graph`: canonical type graph, tag parsing, promotion, optionality
//! - `namespace`: grouping of declarations into output scopes
//! - `translate`: graph node -> TypeScript type expression
//! - `declarations` / `stubs`: TypeScript AST for one scope
//! - `ts`: TypeScript AST and emission (via the `Emit` trait)
//! - `generator`: the pipeline

pub mod config;
pub mod decl;
mod declarations;
pub mod error;
mod generator;
mod graph;
mod namespace;
mod stubs;
mod translate;
mod ts;

pub use config::GeneratorConfig;
pub use decl::DeclarationSet;
pub use error::{Diagnostic, DiagnosticKind, Diagnostics, GenerateError, Severity};
pub use generator::{Generated, HEADER, generate, generate_from_json};
