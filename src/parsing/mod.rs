//! Readers that turn image headers into a [`Header`](crate::core::header::Header).
//!
//! This module provides parsers for:
//!
//! - **FITS files**: any HDU of `.fits` files through cfitsio, gzip-compressed or not
//! - **Card dumps**: text with one `KEYWORD = value / comment` card per line
//! - **JSON**: a flat object of keyword/value pairs
//!
//! Card dumps and JSON files ending in `.gz` are decompressed on the fly.
//! - **Parameter dictionaries**: strict JSON `name -> [values]` maps for obsmode expansion
//!
//! ## Example
//!
//! ```rust,no_run
//! use calref::parsing::{parse_file, text::parse_header_text};
//! use std::path::Path;
//!
//! // Parse from a raw image
//! let header = parse_file(Path::new("j6lq01naq_raw.fits")).unwrap();
//!
//! // Or from a card dump
//! let header = parse_header_text("INSTRUME= 'ACS     '\nDETECTOR= 'WFC     '\n").unwrap();
//! ```

use flate2::read::GzDecoder;
use std::io::Read;
use std::path::Path;

use crate::core::header::Header;

pub mod card;
pub mod fits;
pub mod json;
pub mod params;
pub mod text;

pub use fits::ParseError;

/// Supported header sources
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    Fits,
    Json,
    Text,
}

impl InputFormat {
    /// Guess the format from a file name, looking through a trailing `.gz`
    #[must_use]
    pub fn detect(path: &Path) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        match ext {
            "fits" | "fit" | "fts" => Self::Fits,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

fn is_gzip_name(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

/// Read a text file, decompressing it if the name ends in `.gz`
pub(crate) fn read_text_file(path: &Path) -> Result<String, ParseError> {
    if !is_gzip_name(path) {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut content = String::new();
    GzDecoder::new(std::fs::File::open(path)?).read_to_string(&mut content)?;
    Ok(content)
}

/// Parse a header file, detecting its format from the file name
///
/// # Errors
///
/// Returns any error from the format-specific parser.
pub fn parse_file(path: &Path) -> Result<Header, ParseError> {
    parse_file_as(path, InputFormat::detect(path))
}

/// Parse a header file in the given format
///
/// # Errors
///
/// Returns any error from the format-specific parser.
pub fn parse_file_as(path: &Path, format: InputFormat) -> Result<Header, ParseError> {
    match format {
        InputFormat::Fits => fits::parse_fits_file(path),
        InputFormat::Json => json::parse_json_file(path),
        InputFormat::Text => text::parse_header_file(path),
    }
}

/// Parse a header from a stream such as stdin
///
/// FITS needs random access, so FITS input must come from a file.
///
/// # Errors
///
/// Returns `ParseError::UnsupportedFormat` for FITS, `ParseError::Io` if the
/// stream cannot be read, or any error from the format-specific parser.
pub fn parse_reader<R: Read>(mut reader: R, format: InputFormat) -> Result<Header, ParseError> {
    if format == InputFormat::Fits {
        return Err(ParseError::UnsupportedFormat(
            "FITS input must be read from a file".to_string(),
        ));
    }
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    match format {
        InputFormat::Json => json::parse_json_text(&content),
        _ => text::parse_header_text(&content),
    }
}
