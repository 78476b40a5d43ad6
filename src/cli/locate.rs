use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::warn;

use crate::cli::{load_rule_table, read_header, OutputFormat};
use crate::core::types::Instrument;
use crate::parsing::InputFormat;
use crate::resolving::gate::StepGate;
use crate::resolving::resolver::{ReferenceFileResolver, ResolverConfig};
use crate::staging::executables::CalibrationExecutables;
use crate::staging::locator::{ReferenceLocator, StagingConfig, StagingPlan};

#[derive(Args)]
pub struct LocateArgs {
    /// Input headers (FITS, JSON, or card dump). Use '-' for stdin
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Input format (auto-detected by default)
    #[arg(long)]
    pub input_format: Option<InputFormat>,

    /// Directory holding the raw inputs and local reference files
    #[arg(long, env = "CALREF_INPUT_DIR", default_value = ".")]
    pub input_dir: PathBuf,

    /// CRDS server used for references without a local root
    #[arg(long, env = "CRDS_SERVER_URL")]
    pub crds_url: Option<String>,

    /// When a correction step counts as enabled
    #[arg(long, value_enum, default_value_t = StepGate::Perform)]
    pub gate: StepGate,

    /// Path to custom rule tables (JSON)
    #[arg(long)]
    pub tables: Option<PathBuf>,
}

/// Execute locate subcommand
///
/// # Errors
///
/// Returns an error if a header cannot be read or its instrument is not supported.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: LocateArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let table = load_rule_table(args.tables.as_ref())?;
    let resolver = ReferenceFileResolver::with_config(&table, ResolverConfig { gate: args.gate });

    let mut config = StagingConfig::from_env(&args.input_dir);
    if let Some(url) = &args.crds_url {
        config = config.with_crds_server_url(url.trim());
    }
    let locator = ReferenceLocator::new(&config);

    let mut plan = StagingPlan::default();
    let mut instruments = BTreeSet::new();
    for input in &args.inputs {
        let header = read_header(input, args.input_format)?;
        let resolution = resolver
            .resolve_detailed(&header)
            .with_context(|| format!("Cannot resolve references for {}", input.display()))?;
        instruments.insert(resolution.key.instrument);
        plan.extend(&locator, resolution.values());
    }

    if verbose {
        eprintln!(
            "Planned {} reference files for {} inputs",
            plan.len(),
            args.inputs.len()
        );
    }

    let executables = CalibrationExecutables::from_env();
    let missing: Vec<Instrument> = instruments
        .iter()
        .copied()
        .filter(|i| !executables.is_available(*i))
        .collect();
    for instrument in &missing {
        warn!(
            %instrument,
            executable = instrument.executable_name(),
            "Calibration executable not found on PATH"
        );
    }

    match format {
        OutputFormat::Text => {
            for entry in &plan.entries {
                println!("{:<8} {:<40} {}", entry.location.kind(), entry.identifier, entry.location);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "input_dir": config.input_dir,
                "crds_server_url": config.crds_server_url,
                "references": plan.entries,
                "missing_executables": missing
                    .iter()
                    .map(|i| i.executable_name())
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("identifier\tkind\tlocation");
            for entry in &plan.entries {
                println!("{}\t{}\t{}", entry.identifier, entry.location.kind(), entry.location);
            }
        }
    }

    Ok(())
}
