//! TypeScript generation from a Go declaration set.
//!
//! The pipeline is:
//! 1. Build: DeclarationSet -> TypeGraph (identity, flattening)
//! 2. Resolve: promotion dominance, collisions, destination names
//! 3. Classify: per-field optionality / nullability
//! 4. Group: TypeGraph -> Layout (one scope per namespace, or one flat scope)
//! 5. Emit: per scope, declarations then stubs (via the `Emit` trait)
//!
//! Stages 1-4 are sequential and mutate the graph. Stage 5 only reads it, so
//! grouped scopes are emitted in parallel and merged back in scope order.

use rayon::prelude::*;
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::decl::DeclarationSet;
use crate::declarations::emit_declarations;
use crate::error::{Diagnostic, Diagnostics, GenerateError, Severity};
use crate::graph::{TypeGraph, build, classify, resolve};
use crate::namespace::{Layout, group};
use crate::stubs::emit_stub;
use crate::translate::Translator;
use crate::ts::Emit;
use crate::ts::utils::indent_lines;

/// First line of every generated file.
pub const HEADER: &str = "// Code generated by typebridge. DO NOT EDIT.";

/// Result of a successful run.
#[derive(Debug)]
pub struct Generated {
    /// The TypeScript source unit, ending with exactly one newline.
    pub source: String,
    /// Every diagnostic reported, sorted.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of declarations and stubs written.
    pub emitted: usize,
}

impl Generated {
    /// Whether a name collision dropped declarations from the output.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity() == Severity::Error)
    }
}

/// Emitted text of one scope.
#[derive(Debug)]
struct ScopeOutput {
    body: String,
    count: usize,
    diagnostics: Diagnostics,
}

/// Parse a JSON declaration set and generate TypeScript from it.
pub fn generate_from_json(json: &str, config: &GeneratorConfig) -> Result<Generated, GenerateError> {
    let set = DeclarationSet::from_json(json)?;
    generate(&set, config)
}

/// Generate TypeScript from a declaration set.
pub fn generate(set: &DeclarationSet, config: &GeneratorConfig) -> Result<Generated, GenerateError> {
    if set.declaration_count() == 0 {
        return Err(GenerateError::EmptyInput);
    }

    let mut diagnostics = Diagnostics::default();

    let mut graph = build(set, config, &mut diagnostics);
    resolve(&mut graph, config, &mut diagnostics);
    classify(&mut graph);

    let layout = group(&graph, config, &mut diagnostics);
    debug!(
        scopes = layout.scopes.len(),
        grouped = layout.grouped,
        "declarations grouped"
    );

    let render = |index: usize| render_scope(&graph, &layout, config, index);
    let outputs: Vec<ScopeOutput> = if layout.grouped {
        (0..layout.scopes.len()).into_par_iter().map(render).collect()
    } else {
        (0..layout.scopes.len()).map(render).collect()
    };

    let mut emitted = 0;
    let mut blocks = Vec::new();
    for (index, output) in outputs.into_iter().enumerate() {
        diagnostics.extend(output.diagnostics);
        if output.count == 0 {
            continue;
        }
        emitted += output.count;
        if layout.grouped {
            blocks.push(format!(
                "export namespace {} {{\n{}}}\n",
                layout.scopes[index].name,
                indent_lines(&output.body, 1)
            ));
        } else {
            blocks.push(output.body);
        }
    }

    if emitted == 0 {
        return Err(GenerateError::NothingEmitted {
            found: describe_input(set, &diagnostics),
        });
    }

    let mut source = String::new();
    if config.emit_header {
        source.push_str(HEADER);
        source.push_str("\n\n");
    }
    source.push_str(&blocks.join("\n"));
    let source = format!("{}\n", source.trim_end());

    debug!(emitted, bytes = source.len(), "generation finished");

    Ok(Generated {
        source,
        diagnostics: diagnostics.into_sorted(),
        emitted,
    })
}

fn render_scope(graph: &TypeGraph, layout: &Layout, config: &GeneratorConfig, index: usize) -> ScopeOutput {
    let scope = &layout.scopes[index];
    let translator = Translator::new(graph, layout, config, Some(index));
    let mut diagnostics = Diagnostics::default();

    let mut items: Vec<String> = emit_declarations(scope, &translator, config.declaration_form)
        .iter()
        .map(Emit::emit)
        .collect();
    for function in &scope.functions {
        if let Some(stub) = emit_stub(&graph.functions[*function], &translator, &mut diagnostics) {
            items.push(stub.emit());
        }
    }

    debug!(
        scope = scope.name.as_str(),
        items = items.len(),
        "scope emitted"
    );

    ScopeOutput {
        count: items.len(),
        body: items.join("\n"),
        diagnostics,
    }
}

fn describe_input(set: &DeclarationSet, diagnostics: &Diagnostics) -> String {
    let total = set.declaration_count();
    let exported = set
        .packages
        .iter()
        .flat_map(|p| &p.declarations)
        .filter(|d| d.is_exported())
        .count();
    format!(
        "{total} declarations in {} packages, {exported} exported, {} diagnostics reported",
        set.packages.len(),
        diagnostics.iter().count()
    )
}
