use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::OutputFormat;
use crate::core::obsmode::{generate_obsmodes, interpret_obsmode, parse_filters, ParameterDict};
use crate::parsing::params::load_parameter_dict;

#[derive(Args)]
pub struct ObsmodesArgs {
    /// Base obsmode, e.g. "acs,wfc1"
    #[arg(long, required = true)]
    pub basemode: String,

    /// Parameter dictionary (JSON object of name -> list of values)
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Filters appended to the base mode; mark parameterized ones with '#',
    /// e.g. "f555w,fr853n#"
    #[arg(long)]
    pub filters: Option<String>,
}

/// Execute obsmodes subcommand
///
/// # Errors
///
/// Returns an error if the parameter dictionary cannot be loaded.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ObsmodesArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let params = match &args.params {
        Some(path) => load_parameter_dict(path)
            .with_context(|| format!("Failed to load parameters from {}", path.display()))?,
        None => ParameterDict::new(),
    };

    let basemode = args.basemode.trim().trim_end_matches(',');
    let (basemode, params) = match &args.filters {
        Some(spec) => {
            let filters = parse_filters(spec);
            let selected = params.select(&filters.parameterized);
            if verbose && selected.len() < filters.parameterized.len() {
                eprintln!("Some parameterized filters have no values in the parameter dictionary");
            }
            let base = if filters.filters.is_empty() {
                basemode.to_string()
            } else {
                format!("{basemode},{}", filters.filters)
            };
            (base, selected)
        }
        None => (basemode.to_string(), params),
    };

    let obsmodes = generate_obsmodes(&basemode, &params);
    if verbose {
        eprintln!("Generated {} obsmodes from {} parameters", obsmodes.len(), params.len());
    }

    match format {
        OutputFormat::Text => {
            for obsmode in &obsmodes {
                println!("{obsmode}");
            }
        }
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = obsmodes
                .iter()
                .map(|obsmode| {
                    serde_json::json!({
                        "obsmode": obsmode,
                        "table_obsmode": interpret_obsmode(obsmode),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("obsmode\ttable_obsmode");
            for obsmode in &obsmodes {
                println!("{obsmode}\t{}", interpret_obsmode(obsmode));
            }
        }
    }

    Ok(())
}
