//! Command-line interface for calref.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **resolve**: List the reference files a raw image needs
//! - **locate**: Plan where each needed reference file would come from
//! - **tables**: List, show, or export the rule tables
//! - **executables**: Report which calibration pipelines are installed
//! - **fix-keywords**: Apply keyword fix directives to raw headers
//! - **obsmodes**: Expand an obsmode over a parameter dictionary
//!
//! ## Usage
//!
//! ```text
//! # References needed by a raw ACS image
//! calref resolve j6lq01naq_raw.fits
//!
//! # Pipe a header dump
//! cat header.txt | calref resolve -
//!
//! # JSON output for scripting
//! calref resolve j6lq01naq_raw.fits --format json
//!
//! # Where to stage them from
//! jref=/grp/hst/cdbs/jref/ calref locate *_raw.fits
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::core::header::Header;
use crate::parsing::{self, InputFormat};
use crate::rules::store::RuleTable;

pub mod executables;
pub mod fix_keywords;
pub mod locate;
pub mod obsmodes;
pub mod resolve;
pub mod tables;

#[derive(Parser)]
#[command(name = "calref")]
#[command(version)]
#[command(about = "Resolve the calibration reference files needed by HST raw images")]
#[command(
    long_about = "calref reads the primary header of a raw HST image (ACS, WFC3, STIS) and lists the reference files its calibration pipeline will open.\n\nIt provides:\n- The ordered, de-duplicated list of reference file identifiers\n- Where each file would be staged from (input directory, local CRDS root, or CRDS server)\n- Helpers for keyword fixes and obsmode expansion"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the reference files a raw image needs
    Resolve(resolve::ResolveArgs),

    /// Plan where each needed reference file would be staged from
    Locate(locate::LocateArgs),

    /// Inspect or export the rule tables
    Tables(tables::TablesArgs),

    /// Report which calibration executables are on PATH
    Executables(executables::ExecutablesArgs),

    /// Apply keyword fix directives to raw FITS headers
    FixKeywords(fix_keywords::FixKeywordsArgs),

    /// Expand an obsmode over a parameter dictionary
    Obsmodes(obsmodes::ObsmodesArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Read a header from a file, or from stdin when `input` is `-`
///
/// Stdin is read as a card dump unless a format is given.
pub(crate) fn read_header(input: &Path, format: Option<InputFormat>) -> anyhow::Result<Header> {
    if input.to_string_lossy() == "-" {
        let stdin = std::io::stdin().lock();
        return parsing::parse_reader(stdin, format.unwrap_or(InputFormat::Text))
            .map(|h| h.with_source("-"))
            .context("Failed to read header from stdin");
    }

    let format = format.unwrap_or_else(|| InputFormat::detect(input));
    parsing::parse_file_as(input, format)
        .with_context(|| format!("Failed to read header from {}", input.display()))
}

/// The rule table from `--tables`, or the built-in one
pub(crate) fn load_rule_table(path: Option<&PathBuf>) -> anyhow::Result<RuleTable> {
    match path {
        Some(path) => RuleTable::load_from_file(path)
            .with_context(|| format!("Failed to load rule tables from {}", path.display())),
        None => Ok(RuleTable::builtin()),
    }
}
