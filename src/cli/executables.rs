use std::ffi::OsString;

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::types::Instrument;
use crate::staging::executables::CalibrationExecutables;

#[derive(Args)]
pub struct ExecutablesArgs {
    /// Search path to probe instead of $PATH
    #[arg(long)]
    pub path: Option<OsString>,
}

/// Execute executables subcommand
///
/// # Errors
///
/// Returns an error if JSON output cannot be serialized.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ExecutablesArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let executables = match &args.path {
        Some(path) => CalibrationExecutables::probe(path),
        None => CalibrationExecutables::from_env(),
    };

    if verbose {
        let available = Instrument::ALL
            .iter()
            .filter(|i| executables.is_available(**i))
            .count();
        eprintln!("{available} of {} calibration executables found", Instrument::ALL.len());
    }

    match format {
        OutputFormat::Text => {
            for instrument in Instrument::ALL {
                let location = executables
                    .get(instrument)
                    .map_or_else(|| "not found".to_string(), |p| p.display().to_string());
                println!(
                    "{:<6} {:<10} {location}",
                    instrument.to_string(),
                    instrument.executable_name()
                );
            }
        }
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = Instrument::ALL
                .iter()
                .map(|instrument| {
                    serde_json::json!({
                        "instrument": instrument,
                        "executable": instrument.executable_name(),
                        "path": executables.get(*instrument),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("instrument\texecutable\tpath");
            for instrument in Instrument::ALL {
                println!(
                    "{instrument}\t{}\t{}",
                    instrument.executable_name(),
                    executables
                        .get(instrument)
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}
