use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::{load_rule_table, read_header, OutputFormat};
use crate::parsing::InputFormat;
use crate::resolving::gate::StepGate;
use crate::resolving::resolver::{ReferenceFileResolver, Resolution, ResolverConfig};

#[derive(Args)]
pub struct ResolveArgs {
    /// Input headers (FITS, JSON, or card dump)
    /// Use '-' for stdin (expects a card dump unless --input-format is given)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Input format (auto-detected by default)
    #[arg(long)]
    pub input_format: Option<InputFormat>,

    /// When a correction step counts as enabled
    #[arg(long, value_enum, default_value_t = StepGate::Perform)]
    pub gate: StepGate,

    /// Path to custom rule tables (JSON, as written by `tables export`)
    #[arg(long)]
    pub tables: Option<PathBuf>,

    /// Sort identifiers alphabetically instead of resolution order
    #[arg(long)]
    pub sorted: bool,
}

/// Execute resolve subcommand
///
/// # Errors
///
/// Returns an error if a header cannot be read or its instrument is not supported.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ResolveArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let table = load_rule_table(args.tables.as_ref())?;
    let resolver = ReferenceFileResolver::with_config(&table, ResolverConfig { gate: args.gate });

    let mut results = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let header = read_header(input, args.input_format)?;
        let mut resolution = resolver
            .resolve_detailed(&header)
            .with_context(|| format!("Cannot resolve references for {}", input.display()))?;
        if args.sorted {
            resolution.references.sort_by(|a, b| a.value.cmp(&b.value));
        }
        results.push((input.display().to_string(), resolution));
    }

    match format {
        OutputFormat::Text => print_text(&results, verbose),
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Tsv => print_tsv(&results),
    }

    Ok(())
}

fn print_text(results: &[(String, Resolution)], verbose: bool) {
    for (index, (input, resolution)) in results.iter().enumerate() {
        if index > 0 {
            println!();
        }
        println!(
            "{input} ({}, {} reference files)",
            resolution.key,
            resolution.references.len()
        );
        for reference in &resolution.references {
            println!(
                "  {:<40} {:<9} {}",
                reference.value, reference.keyword, reference.origin
            );
        }

        if verbose {
            if !resolution.disabled_steps.is_empty() {
                eprintln!("  Steps not enabled: {}", resolution.disabled_steps.join(", "));
            }
            for skipped in &resolution.skipped {
                eprintln!(
                    "  Skipped {} ({}): {:?}",
                    skipped.keyword, skipped.origin, skipped.reason
                );
            }
        }
    }
}

fn print_json(results: &[(String, Resolution)]) -> anyhow::Result<()> {
    let output: Vec<serde_json::Value> = results
        .iter()
        .map(|(input, resolution)| {
            serde_json::json!({
                "input": input,
                "instrument": resolution.key.instrument,
                "detector": resolution.key.detector,
                "references": resolution.values(),
                "details": resolution.references,
                "skipped": resolution.skipped,
                "disabled_steps": resolution.disabled_steps,
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(results: &[(String, Resolution)]) {
    println!("input\tinstrument\tdetector\treference\tkeyword\torigin");
    for (input, resolution) in results {
        for reference in &resolution.references {
            println!(
                "{input}\t{}\t{}\t{}\t{}\t{}",
                resolution.key.instrument,
                resolution.key.detector,
                reference.value,
                reference.keyword,
                reference.origin
            );
        }
    }
}
