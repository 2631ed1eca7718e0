//! Fatal errors and per-declaration diagnostics.
//!
//! Only a handful of conditions abort a run (see [`GenerateError`]). Everything
//! else is collected as a [`Diagnostic`] against the declaration it concerns,
//! logged through `tracing`, and generation carries on.

use std::fmt;

use thiserror::Error;
use tracing::{error, warn};

/// Errors that abort a whole generation run.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The declaration set is not valid JSON or does not match the schema.
    #[error("invalid declaration set: {0}")]
    InvalidInput(#[source] serde_json::Error),

    /// The TOML configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[source] toml::de::Error),

    /// No package carries any declaration.
    #[error("empty declaration set: expected at least one package with declarations")]
    EmptyInput,

    /// No declaration translated cleanly, so there is nothing to emit.
    #[error(
        "nothing to generate: expected at least one exported struct, named type or endpoint \
         function that translates cleanly, found {found}"
    )]
    NothingEmitted {
        /// Summary of what the input held.
        found: String,
    },
}

/// How bad a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// The declaration is degraded or skipped; the output is still usable.
    Warning,
    /// Declarations were dropped from the output.
    Error,
}

/// The four recoverable failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticKind {
    /// An origin type the builder could not classify; rendered as the top type.
    UnresolvableType,
    /// Two fields of a record, or two top-level declarations of a scope,
    /// share a destination name.
    NameCollision,
    /// A struct tag that could not be parsed; the declared name is used.
    MalformedTag,
    /// An endpoint whose shape cannot be expressed as a stub.
    UnsupportedTransport,
}

impl DiagnosticKind {
    /// Name collisions are errors, everything else is a warning.
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::NameCollision => Severity::Error,
            DiagnosticKind::UnresolvableType
            | DiagnosticKind::MalformedTag
            | DiagnosticKind::UnsupportedTransport => Severity::Warning,
        }
    }

    /// Human-readable label used in logs and `Display`.
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::UnresolvableType => "unresolvable type",
            DiagnosticKind::NameCollision => "name collision",
            DiagnosticKind::MalformedTag => "malformed tag",
            DiagnosticKind::UnsupportedTransport => "unsupported transport",
        }
    }
}

/// A problem attached to one declaration (or one scope).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Diagnostic {
    /// Failure class.
    pub kind: DiagnosticKind,
    /// Import path of the package, empty for the flattened scope.
    pub package: String,
    /// Origin name of the declaration, or the scope name.
    pub declaration: String,
    /// What went wrong.
    pub message: String,
}

impl Diagnostic {
    /// Severity of the diagnostic's kind.
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity() {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        if self.package.is_empty() {
            write!(f, "{level}: {}: {}: {}", self.kind.as_str(), self.declaration, self.message)
        } else {
            write!(
                f,
                "{level}: {}: {}.{}: {}",
                self.kind.as_str(),
                self.package,
                self.declaration,
                self.message
            )
        }
    }
}

/// Collector threaded through the pipeline stages.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Record and log a diagnostic.
    pub fn report(
        &mut self,
        kind: DiagnosticKind,
        package: &str,
        declaration: &str,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            package: package.to_string(),
            declaration: declaration.to_string(),
            message: message.into(),
        };
        match diagnostic.severity() {
            Severity::Warning => warn!(
                kind = kind.as_str(),
                package,
                declaration,
                "{}",
                diagnostic.message
            ),
            Severity::Error => error!(
                kind = kind.as_str(),
                package,
                declaration,
                "{}",
                diagnostic.message
            ),
        }
        self.items.push(diagnostic);
    }

    /// Append everything collected by another stage.
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Diagnostics in report order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Whether any error-severity diagnostic was reported.
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity() == Severity::Error)
    }

    /// Stable order: parallel stages may report in any interleaving.
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.items.sort();
        self.items.dedup();
        self.items
    }
}
