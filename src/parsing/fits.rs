//! FITS header access through cfitsio.
//!
//! Headers are read keyword by keyword with the low-level cfitsio calls so
//! that long-string (CONTINUE) values come back joined, exactly as cfitsio
//! interprets them. cfitsio also opens gzip-compressed files transparently.

use std::ffi::{c_char, c_int, CStr, CString};
use std::path::{Path, PathBuf};
use std::ptr;

use fitsio::errors::check_status as fits_check_status;
use fitsio::FitsFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::header::{Header, HeaderValue};
use crate::parsing::card::parse_value;
use crate::utils::validation::{check_card_limit, is_valid_keyword, CARD_LENGTH};

/// cfitsio status for a keyword that does not exist
const KEY_NO_EXIST: c_int = 202;
/// cfitsio status for a keyword without a value
const VALUE_UNDEFINED: c_int = 204;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid header format: {0}")]
    InvalidFormat(String),

    #[error("{0}")]
    TooManyCards(String),

    #[error("Invalid JSON header: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("{path}: {source}")]
    Fits {
        path: PathBuf,
        #[source]
        source: Box<fitsio::errors::Error>,
    },
}

impl ParseError {
    fn fits(path: &Path, source: fitsio::errors::Error) -> Self {
        Self::Fits {
            path: path.to_path_buf(),
            source: Box::new(source),
        }
    }
}

/// Open a FITS file read-only.
///
/// # Errors
///
/// Returns `ParseError::Fits` if cfitsio cannot open the file.
pub fn fits_open(path: &Path) -> Result<FitsFile, ParseError> {
    FitsFile::open(path).map_err(|e| ParseError::fits(path, e))
}

/// Open a FITS file for in-place updates. Compressed files cannot be edited.
///
/// # Errors
///
/// Returns `ParseError::Fits` if cfitsio cannot open the file for writing.
pub fn fits_edit(path: &Path) -> Result<FitsFile, ParseError> {
    FitsFile::edit(path).map_err(|e| ParseError::fits(path, e))
}

/// Make HDU `ext` current; 0 is the primary header.
///
/// # Errors
///
/// Returns `ParseError::Fits` if the file has no such HDU.
pub fn fits_select_hdu(fits: &mut FitsFile, ext: usize) -> Result<(), ParseError> {
    match fits.hdu(ext) {
        Ok(_) => Ok(()),
        Err(e) => Err(ParseError::fits(fits.file_path(), e)),
    }
}

fn check_status(fits: &FitsFile, status: c_int) -> Result<(), ParseError> {
    fits_check_status(status).map_err(|e| ParseError::fits(fits.file_path(), e))
}

fn c_string(text: &str) -> Result<CString, ParseError> {
    if !text.is_ascii() {
        return Err(ParseError::InvalidFormat(format!("'{text}' is not ASCII")));
    }
    CString::new(text)
        .map_err(|_| ParseError::InvalidFormat(format!("{text:?} contains a NUL byte")))
}

fn buffer_text(buffer: &[c_char]) -> Result<String, ParseError> {
    let bytes: Vec<u8> = buffer
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8(bytes)
        .map_err(|_| ParseError::InvalidFormat("header card is not ASCII".to_string()))
}

/// Number of keywords in the current HDU, END excluded
fn keyword_count(fits: &mut FitsFile) -> Result<usize, ParseError> {
    let mut nexist = 0;
    let mut nmore = 0;
    let mut status = 0;
    unsafe {
        // ffghsp = fits_get_hdrspace
        fitsio_sys::ffghsp(fits.as_raw(), &mut nexist, &mut nmore, &mut status);
    }
    check_status(fits, status)?;
    Ok(usize::try_from(nexist).unwrap_or_default())
}

/// Keyword and raw value field of card `n` (1-based) in the current HDU
fn read_card(fits: &mut FitsFile, n: c_int) -> Result<(String, String), ParseError> {
    let mut keyword: [c_char; CARD_LENGTH + 1] = [0; CARD_LENGTH + 1];
    let mut value: [c_char; CARD_LENGTH + 1] = [0; CARD_LENGTH + 1];
    let mut comment: [c_char; CARD_LENGTH + 1] = [0; CARD_LENGTH + 1];
    let mut status = 0;
    unsafe {
        // ffgkyn = fits_read_keyn
        fitsio_sys::ffgkyn(
            fits.as_raw(),
            n,
            keyword.as_mut_ptr(),
            value.as_mut_ptr(),
            comment.as_mut_ptr(),
            &mut status,
        );
    }
    check_status(fits, status)?;
    Ok((buffer_text(&keyword)?, buffer_text(&value)?))
}

/// Read the first `keyword` at or after card `from` in the current HDU,
/// joining CONTINUE cards.
///
/// A trailing `&` only marks a continuation when a CONTINUE card follows;
/// otherwise it stays in the value.
fn read_long_string(
    fits: &mut FitsFile,
    from: c_int,
    keyword: &str,
) -> Result<Option<String>, ParseError> {
    let keyword_c = c_string(keyword)?;
    let mut status = 0;
    let mut value_ptr: *mut c_char = ptr::null_mut();
    unsafe {
        // ffmaky = fits_movabs_key
        fitsio_sys::ffmaky(fits.as_raw(), from, &mut status);
        // ffgkls = fits_read_key_longstr
        fitsio_sys::ffgkls(
            fits.as_raw(),
            keyword_c.as_ptr(),
            &mut value_ptr,
            ptr::null_mut(),
            &mut status,
        );
    }

    let value = if value_ptr.is_null() {
        None
    } else {
        unsafe {
            let text = CStr::from_ptr(value_ptr).to_str().map(str::to_string);
            // fffree = fits_free_memory
            fitsio_sys::fffree(value_ptr.cast(), &mut 0);
            Some(text)
        }
    };

    match status {
        KEY_NO_EXIST | VALUE_UNDEFINED => Ok(None),
        _ => {
            check_status(fits, status)?;
            match value {
                Some(Ok(text)) => Ok(Some(text)),
                Some(Err(_)) => Err(ParseError::InvalidFormat(format!(
                    "value of {keyword} is not ASCII"
                ))),
                None => Ok(None),
            }
        }
    }
}

/// String value of `keyword` in the current HDU, CONTINUE cards joined.
///
/// # Errors
///
/// Returns `ParseError::Fits` if cfitsio fails to read the header.
pub fn read_string_key(fits: &mut FitsFile, keyword: &str) -> Result<Option<String>, ParseError> {
    read_long_string(fits, 1, keyword)
}

/// Update `keyword` in the current HDU, keeping its comment.
///
/// Values too long for one card are written as a long string with CONTINUE
/// cards.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for a non-ASCII value, or
/// `ParseError::Fits` if cfitsio fails to write the card.
pub fn write_string_key(fits: &mut FitsFile, keyword: &str, value: &str) -> Result<(), ParseError> {
    let keyword_c = c_string(keyword)?;
    let value_c = c_string(value)?;
    let mut status = 0;
    unsafe {
        // ffukls = fits_update_key_longstr; a null comment keeps the old one
        fitsio_sys::ffukls(
            fits.as_raw(),
            keyword_c.as_ptr(),
            value_c.as_ptr(),
            ptr::null(),
            &mut status,
        );
    }
    check_status(fits, status)
}

/// Read every keyword of HDU `ext` into a [`Header`].
///
/// Commentary cards and keywords that are not legal FITS keywords are
/// skipped. The first card of a repeated keyword wins.
///
/// # Errors
///
/// Returns `ParseError::Fits` if the HDU cannot be read,
/// `ParseError::TooManyCards` if the header exceeds the card limit, or
/// `ParseError::InvalidFormat` for non-ASCII cards.
pub fn read_hdu_header(fits: &mut FitsFile, ext: usize) -> Result<Header, ParseError> {
    fits_select_hdu(fits, ext)?;
    let count = keyword_count(fits)?;
    let mut header = Header::new();

    for index in 0..count {
        if let Some(message) = check_card_limit(index) {
            return Err(ParseError::TooManyCards(message));
        }
        let n = c_int::try_from(index + 1)
            .map_err(|_| ParseError::InvalidFormat(format!("card {} out of range", index + 1)))?;
        let (keyword, raw) = read_card(fits, n)?;

        match keyword.as_str() {
            "" | "COMMENT" | "HISTORY" | "CONTINUE" => continue,
            _ if raw.is_empty() => continue,
            _ if !is_valid_keyword(&keyword) => {
                warn!(%keyword, "Ignoring card with invalid keyword");
                continue;
            }
            _ if header.value(&keyword).is_some() => {
                debug!(%keyword, "Duplicate keyword, keeping first card");
                continue;
            }
            _ => {}
        }

        let value = if raw.starts_with('\'') {
            match read_long_string(fits, n, &keyword)? {
                Some(text) => HeaderValue::String(text),
                None => continue,
            }
        } else {
            parse_value(&raw)
        };
        header.insert(&keyword, value);
    }

    Ok(header)
}

/// Read the primary header of a FITS file, gzip-compressed or not
///
/// # Errors
///
/// Returns any error from [`fits_open`] or [`read_hdu_header`].
pub fn parse_fits_file(path: &Path) -> Result<Header, ParseError> {
    let mut fits = fits_open(path)?;
    let header = read_hdu_header(&mut fits, 0)?;
    debug!(path = %path.display(), cards = header.len(), "Read FITS primary header");
    Ok(header.with_source(path.display().to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::utils::validation::BLOCK_LENGTH;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn padded(cards: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        for card in cards.iter().chain(["END"].iter()) {
            out.extend_from_slice(format!("{card:<80}").as_bytes());
        }
        out.resize(out.len().div_ceil(BLOCK_LENGTH) * BLOCK_LENGTH, b' ');
        out
    }

    /// Build a minimal FITS primary header (no data) from card strings
    pub(crate) fn fits_bytes(cards: &[&str]) -> Vec<u8> {
        let mut all = vec![
            "SIMPLE  =                    T",
            "BITPIX  =                    8",
            "NAXIS   =                    0",
            "EXTEND  =                    T",
        ];
        all.extend_from_slice(cards);
        padded(&all)
    }

    /// A dataless IMAGE extension to append after [`fits_bytes`]
    pub(crate) fn extension_bytes(cards: &[&str]) -> Vec<u8> {
        let mut all = vec![
            "XTENSION= 'IMAGE   '",
            "BITPIX  =                    8",
            "NAXIS   =                    0",
            "PCOUNT  =                    0",
            "GCOUNT  =                    1",
        ];
        all.extend_from_slice(cards);
        padded(&all)
    }

    fn write_temp(name: &str, bytes: &[u8]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        (dir, path)
    }

    #[test]
    fn test_parse_fits_file() {
        let (_dir, path) = write_temp(
            "j6lq01naq_raw.fits",
            &fits_bytes(&[
                "INSTRUME= 'ACS     '           / identifier for instrument used to acquire data",
                "DETECTOR= 'WFC     '",
                "EXPTIME =                 30.5",
                "COMMENT   not a value",
            ]),
        );
        let header = parse_fits_file(&path).unwrap();
        assert_eq!(header.value("INSTRUME").and_then(HeaderValue::as_str), Some("ACS"));
        assert_eq!(header.value("NAXIS"), Some(&HeaderValue::Integer(0)));
        assert_eq!(header.value("EXPTIME"), Some(&HeaderValue::Real(30.5)));
        assert_eq!(header.value("SIMPLE"), Some(&HeaderValue::Logical(true)));
        assert!(header.value("COMMENT").is_none());
        assert!(header.source.unwrap().ends_with("j6lq01naq_raw.fits"));
    }

    #[test]
    fn test_continue_cards_join() {
        let (_dir, path) = write_temp(
            "raw.fits",
            &fits_bytes(&[
                "LONGSTR = 'jref$part_one&'",
                "CONTINUE  'part_two&'",
                "CONTINUE  '.fits'",
                "AFTER   = 'x'",
            ]),
        );
        let header = parse_fits_file(&path).unwrap();
        assert_eq!(
            header.value("LONGSTR").and_then(HeaderValue::as_str),
            Some("jref$part_onepart_two.fits")
        );
        assert_eq!(header.value("AFTER").and_then(HeaderValue::as_str), Some("x"));
    }

    #[test]
    fn test_trailing_ampersand_without_continue() {
        let (_dir, path) = write_temp(
            "raw.fits",
            &fits_bytes(&["CCDTAB  = 'jref$ccd&'", "DETECTOR= 'WFC     '"]),
        );
        let header = parse_fits_file(&path).unwrap();
        assert_eq!(
            header.value("CCDTAB").and_then(HeaderValue::as_str),
            Some("jref$ccd&")
        );
        assert_eq!(header.value("DETECTOR").and_then(HeaderValue::as_str), Some("WFC"));
    }

    #[test]
    fn test_duplicate_keyword_keeps_first() {
        let (_dir, path) = write_temp(
            "raw.fits",
            &fits_bytes(&["DARKFILE= 'jref$first.fits'", "DARKFILE= 'jref$second.fits'"]),
        );
        let header = parse_fits_file(&path).unwrap();
        assert_eq!(
            header.value("DARKFILE").and_then(HeaderValue::as_str),
            Some("jref$first.fits")
        );
    }

    #[test]
    fn test_header_spanning_blocks() {
        let filler: Vec<String> = (0..40).map(|i| format!("KEY{i:<5}= {i}")).collect();
        let mut cards: Vec<&str> = filler.iter().map(String::as_str).collect();
        cards.push("LAST    = 'tail'");
        let bytes = fits_bytes(&cards);
        assert_eq!(bytes.len(), 2 * BLOCK_LENGTH);

        let (_dir, path) = write_temp("raw.fits", &bytes);
        let header = parse_fits_file(&path).unwrap();
        assert_eq!(header.value("LAST").and_then(HeaderValue::as_str), Some("tail"));
        assert_eq!(header.value("KEY39"), Some(&HeaderValue::Integer(39)));
    }

    #[test]
    fn test_extension_header() {
        let mut bytes = fits_bytes(&["INSTRUME= 'WFC3    '"]);
        bytes.extend(extension_bytes(&["EXTNAME = 'SCI     '", "PHOTMODE= 'WFC3 UVIS1 F606W'"]));
        let (_dir, path) = write_temp("raw.fits", &bytes);

        let mut fits = fits_open(&path).unwrap();
        let ext = read_hdu_header(&mut fits, 1).unwrap();
        assert_eq!(ext.value("EXTNAME").and_then(HeaderValue::as_str), Some("SCI"));
        assert!(ext.value("INSTRUME").is_none());

        let primary = read_hdu_header(&mut fits, 0).unwrap();
        assert_eq!(primary.value("INSTRUME").and_then(HeaderValue::as_str), Some("WFC3"));
        assert!(read_hdu_header(&mut fits, 2).is_err());
    }

    #[test]
    fn test_missing_end() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(format!("{:<80}", "SIMPLE  =                    T").as_bytes());
        bytes.resize(BLOCK_LENGTH, b' ');
        let (_dir, path) = write_temp("raw.fits", &bytes);
        assert!(matches!(parse_fits_file(&path), Err(ParseError::Fits { .. })));
    }

    #[test]
    fn test_not_fits() {
        let (_dir, path) = write_temp("raw.fits", &vec![b'x'; BLOCK_LENGTH]);
        assert!(matches!(parse_fits_file(&path), Err(ParseError::Fits { .. })));
    }

    #[test]
    fn test_non_ascii_value_does_not_panic() {
        let mut bytes = fits_bytes(&["OBSERVER= 'Jose'", "INSTRUME= 'STIS    '"]);
        let pos = bytes.windows(4).position(|w| w == b"Jose").unwrap();
        bytes[pos + 3] = 0xE9;
        let (_dir, path) = write_temp("raw.fits", &bytes);

        match parse_fits_file(&path) {
            Ok(header) => {
                assert_eq!(header.value("INSTRUME").and_then(HeaderValue::as_str), Some("STIS"));
            }
            Err(e) => assert!(matches!(e, ParseError::Fits { .. } | ParseError::InvalidFormat(_))),
        }
    }

    #[test]
    fn test_parse_gzip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("j6lq01naq_raw.fits.gz");
        let mut encoder =
            GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        encoder
            .write_all(&fits_bytes(&["INSTRUME= 'STIS    '"]))
            .unwrap();
        encoder.finish().unwrap();

        let header = parse_fits_file(&path).unwrap();
        assert_eq!(header.value("INSTRUME").and_then(HeaderValue::as_str), Some("STIS"));
    }

    #[test]
    fn test_write_string_key_keeps_comment() {
        let (_dir, path) = write_temp(
            "raw.fits",
            &fits_bytes(&[
                "PCTETAB = '/grp/hst/cdbs/jref/filename.fits' / CTE table",
                "FLSHFILE= 'jref$localfile.fits'",
            ]),
        );
        {
            let mut fits = fits_edit(&path).unwrap();
            fits_select_hdu(&mut fits, 0).unwrap();
            write_string_key(&mut fits, "PCTETAB", "jref$filename.fits").unwrap();
        }

        let bytes = std::fs::read(&path).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/ CTE table"));
        let header = parse_fits_file(&path).unwrap();
        assert_eq!(
            header.value("PCTETAB").and_then(HeaderValue::as_str),
            Some("jref$filename.fits")
        );
        assert_eq!(
            header.value("FLSHFILE").and_then(HeaderValue::as_str),
            Some("jref$localfile.fits")
        );
    }

    #[test]
    fn test_write_long_string_key() {
        let (_dir, path) = write_temp("raw.fits", &fits_bytes(&["PCTETAB = 'jref$short.fits'"]));
        let long = format!("jref${}.fits", "x".repeat(65));
        assert_eq!(long.len(), 75);
        {
            let mut fits = fits_edit(&path).unwrap();
            fits_select_hdu(&mut fits, 0).unwrap();
            write_string_key(&mut fits, "PCTETAB", &long).unwrap();
        }

        let bytes = std::fs::read(&path).unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("CONTINUE"));
        let mut fits = fits_open(&path).unwrap();
        assert_eq!(read_string_key(&mut fits, "PCTETAB").unwrap(), Some(long.clone()));
        let header = read_hdu_header(&mut fits, 0).unwrap();
        assert_eq!(header.value("PCTETAB").and_then(HeaderValue::as_str), Some(long.as_str()));
    }

    #[test]
    fn test_read_string_key_missing() {
        let (_dir, path) = write_temp("raw.fits", &fits_bytes(&[]));
        let mut fits = fits_open(&path).unwrap();
        assert_eq!(read_string_key(&mut fits, "PCTETAB").unwrap(), None);
    }

    #[test]
    fn test_write_non_ascii_rejected() {
        let (_dir, path) = write_temp("raw.fits", &fits_bytes(&["OBSERVER= 'x'"]));
        let mut fits = fits_edit(&path).unwrap();
        assert!(matches!(
            write_string_key(&mut fits, "OBSERVER", "Jos\u{e9}"),
            Err(ParseError::InvalidFormat(_))
        ));
    }
}
