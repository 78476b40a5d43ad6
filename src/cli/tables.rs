use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};

use crate::cli::{load_rule_table, OutputFormat};
use crate::core::types::InstrumentDetectorKey;
use crate::rules::store::RuleTable;

#[derive(Args)]
pub struct TablesArgs {
    #[command(subcommand)]
    pub command: TablesCommands,

    /// Path to custom rule tables (defaults to the built-in tables)
    #[arg(long, global = true)]
    pub tables: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum TablesCommands {
    /// List supported instrument/detector pairs and correction steps
    List,

    /// Show the keywords checked for one instrument/detector
    Show {
        /// Instrument, e.g. "ACS"
        #[arg(required = true)]
        instrument: String,

        /// Detector, e.g. "WFC" or "FUV-MAMA"
        #[arg(required = true)]
        detector: String,
    },

    /// Export the rule tables as JSON
    Export {
        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Execute tables subcommand
///
/// # Errors
///
/// Returns an error if the tables cannot be loaded or written, or the
/// instrument/detector pair is unknown.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: TablesArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let table = load_rule_table(args.tables.as_ref())?;
    if verbose {
        eprintln!(
            "Loaded {} mandatory rules and {} correction steps",
            table.mandatory().len(),
            table.corrections().len()
        );
    }

    match args.command {
        TablesCommands::List => run_list(&table, format),
        TablesCommands::Show {
            instrument,
            detector,
        } => run_show(&table, &instrument, &detector, format),
        TablesCommands::Export { output } => run_export(&table, output),
    }
}

fn run_list(table: &RuleTable, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Instrument/detector pairs ({})\n", table.mandatory().len());
            println!("{:<10} {:<10} Mandatory keywords", "Instrument", "Detector");
            println!("{}", "-".repeat(72));
            for rule in table.mandatory() {
                println!(
                    "{:<10} {:<10} {}",
                    rule.instrument.to_string(),
                    rule.detector.to_string(),
                    rule.keywords.join(", ")
                );
            }

            println!("\nCorrection steps ({})\n", table.corrections().len());
            for rule in table.corrections() {
                println!("{:<10} {}", rule.step, rule.keywords.join(", "));
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "mandatory": table.mandatory(),
                "corrections": table.corrections(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("kind\tname\tkeywords");
            for rule in table.mandatory() {
                println!("mandatory\t{}\t{}", rule.key(), rule.keywords.join(","));
            }
            for rule in table.corrections() {
                println!("step\t{}\t{}", rule.step, rule.keywords.join(","));
            }
        }
    }
    Ok(())
}

fn run_show(
    table: &RuleTable,
    instrument: &str,
    detector: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let key = InstrumentDetectorKey::parse(instrument, detector)?;
    let mandatory = table
        .mandatory_for(&key)
        .with_context(|| format!("No mandatory rule for {key}"))?;

    match format {
        OutputFormat::Text => {
            println!("{key}\n");
            println!("Mandatory:");
            for keyword in mandatory {
                println!("  {keyword}");
            }
            println!("\nWhen the step is enabled:");
            for rule in table.corrections() {
                println!("  {:<10} {}", rule.step, rule.keywords.join(", "));
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "instrument": key.instrument,
                "detector": key.detector,
                "mandatory": mandatory,
                "corrections": table.corrections(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("origin\tkeyword");
            for keyword in mandatory {
                println!("mandatory\t{keyword}");
            }
            for rule in table.corrections() {
                for keyword in &rule.keywords {
                    println!("{}\t{keyword}", rule.step);
                }
            }
        }
    }
    Ok(())
}

fn run_export(table: &RuleTable, output: Option<PathBuf>) -> anyhow::Result<()> {
    let json = table.to_json()?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Exported {} mandatory rules and {} correction steps to {}",
                table.mandatory().len(),
                table.corrections().len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
