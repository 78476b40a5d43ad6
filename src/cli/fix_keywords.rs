use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;

use crate::cli::OutputFormat;
use crate::parsing::InputFormat;
use crate::staging::fixes::{check_fits_file, fix_fits_file, KeyFixes};

#[derive(Args)]
pub struct FixKeywordsArgs {
    /// JSON directives: {"KEYWORD": {"ext": 0, "wrong": "...", "correct": "..."}}
    #[arg(long, required = true)]
    pub directives: PathBuf,

    /// Raw FITS files to update in place; every extension a directive names is edited
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute fix-keywords subcommand
///
/// # Errors
///
/// Returns an error if the directives are invalid, an input is not a FITS
/// file, or a header cannot be rewritten.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: FixKeywordsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let fixes = KeyFixes::load_from_file(&args.directives)
        .with_context(|| format!("Failed to load directives from {}", args.directives.display()))?;
    if verbose {
        eprintln!("Loaded {} fix directives", fixes.len());
    }

    let mut reports = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        if InputFormat::detect(input) != InputFormat::Fits {
            bail!("{} is not a FITS file", input.display());
        }

        let report = if args.dry_run {
            check_fits_file(input, &fixes)?
        } else {
            fix_fits_file(input, &fixes)?
        };
        reports.push(report);
    }

    match format {
        OutputFormat::Text => {
            let verb = if args.dry_run { "would update" } else { "updated" };
            for report in &reports {
                if report.updated.is_empty() {
                    println!("{}: no changes", report.path.display());
                } else {
                    let keys: Vec<String> = report.updated.iter().map(ToString::to_string).collect();
                    println!("{}: {verb} {}", report.path.display(), keys.join(", "));
                }
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "dry_run": args.dry_run,
                "files": reports,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("path\text\tkeyword");
            for report in &reports {
                for fix in &report.updated {
                    println!("{}\t{}\t{}", report.path.display(), fix.ext, fix.keyword);
                }
            }
        }
    }

    Ok(())
}
