//! Argument parsing and the generation command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use oasrego_compiler::{Generator, GeneratorConfig, DEFAULT_OUTPUT_FILE, DEFAULT_PACKAGE_NAME};
use oasrego_core::OpenApiDocument;

/// Generate a Rego authorization policy from an OpenAPI 3 document
#[derive(Parser, Debug)]
#[command(name = "openapi-to-rego")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the OpenAPI document (JSON or YAML)
    pub spec: PathBuf,

    /// Rego package of the generated policy
    #[arg(
        short,
        long,
        env = "OPENAPI_TO_REGO_PACKAGE",
        default_value = DEFAULT_PACKAGE_NAME
    )]
    pub package_name: String,

    /// File the policy is written to
    #[arg(
        short,
        long,
        env = "OPENAPI_TO_REGO_OUTPUT",
        default_value = DEFAULT_OUTPUT_FILE
    )]
    pub output_filename: PathBuf,

    /// Parse the generated policy before writing it
    #[arg(long)]
    pub verify: bool,
}

/// Loads the document, generates the policy and writes it out.
///
/// Nothing is written when any step before the write fails.
pub fn run(cli: &Cli) -> Result<()> {
    info!(spec = ?cli.spec, package = %cli.package_name, "Generating policy");

    let doc = OpenApiDocument::from_file(&cli.spec)
        .with_context(|| format!("failed to load {}", cli.spec.display()))?;

    let config = GeneratorConfig::new(&cli.package_name).with_verification(cli.verify);
    let policy = Generator::new(config)
        .generate(&doc)
        .with_context(|| format!("failed to generate policy from {}", cli.spec.display()))?;

    policy
        .write_to(&cli.output_filename)
        .with_context(|| format!("failed to write {}", cli.output_filename.display()))?;

    println!(
        "Wrote {} ({} records, {} lines)",
        cli.output_filename.display(),
        policy.record_count,
        policy.line_count()
    );

    Ok(())
}
