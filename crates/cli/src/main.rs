//! typebridge - Go declarations to TypeScript
//!
//! Reads a JSON declaration set, generates TypeScript declarations and fetch
//! stubs, and writes them to stdout or a file. With `--check` the existing
//! file is compared instead and a unified diff is printed when it is stale.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use similar::TextDiff;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use typebridge_core::{GeneratorConfig, Severity, generate_from_json};

#[derive(Parser, Debug)]
#[command(
    name = "typebridge",
    version,
    about = "Generate TypeScript declarations and fetch stubs from Go declarations"
)]
struct Args {
    #[arg(long, value_name = "FILE", help = "JSON declaration set produced by the Go parser")]
    input: PathBuf,
    #[arg(long, value_name = "FILE", help = "TOML generator configuration")]
    config: Option<PathBuf>,
    #[arg(
        long,
        value_name = "FILE",
        help = "Write the TypeScript output to this file instead of stdout"
    )]
    output: Option<PathBuf>,
    #[arg(
        long,
        requires = "output",
        help = "Compare with the existing output file and fail with a diff when it is stale"
    )]
    check: bool,
}

fn main() {
    // Logs go to stderr; stdout may carry the generated source.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "typebridge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if let Err(err) = run(&args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), String> {
    let input = read(&args.input)?;
    let config = match &args.config {
        Some(path) => GeneratorConfig::from_toml_str(&read(path)?).map_err(|err| err.to_string())?,
        None => GeneratorConfig::default(),
    };
    debug!(input = %args.input.display(), "generating");

    let generated = generate_from_json(&input, &config).map_err(|err| err.to_string())?;
    info!(
        emitted = generated.emitted,
        diagnostics = generated.diagnostics.len(),
        "TypeScript generated"
    );

    match &args.output {
        Some(path) if args.check => check(path, &generated.source)?,
        Some(path) => fs::write(path, &generated.source)
            .map_err(|err| format!("Failed to write {}: {err}", path.display()))?,
        None => print!("{}", generated.source),
    }

    if generated.has_errors() {
        let errors = generated
            .diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Error)
            .count();
        return Err(format!("{errors} error diagnostic(s) reported"));
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("Failed to read {}: {err}", path.display()))
}

/// Fail with a unified diff when `path` doesn't hold `generated`.
fn check(path: &Path, generated: &str) -> Result<(), String> {
    let existing = if path.exists() { read(path)? } else { String::new() };
    if existing == generated {
        info!(output = %path.display(), "up to date");
        return Ok(());
    }

    let current = format!("{} (current)", path.display());
    let new = format!("{} (generated)", path.display());
    let diff = TextDiff::from_lines(existing.as_str(), generated);
    print!("{}", diff.unified_diff().context_radius(3).header(&current, &new));

    Err(format!(
        "{} is out of date; rerun without --check to update it",
        path.display()
    ))
}
