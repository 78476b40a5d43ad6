use std::path::Path;

use crate::core::header::Header;
use crate::parsing::card::{parse_card, HeaderBuilder};
use crate::parsing::fits::ParseError;
use crate::parsing::read_text_file;

/// Parse a header card dump file (one card per line), gzip-compressed or not
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_header_file(path: &Path) -> Result<Header, ParseError> {
    let content = read_text_file(path)?;
    Ok(parse_header_text(&content)?.with_source(path.display().to_string()))
}

/// Parse header cards from text, one card per line.
///
/// This accepts what `fitsheader` or `print(repr(header))` produce, as well as
/// a raw primary header with its 80-column cards on a single line. Parsing
/// stops at an `END` card if one is present.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for malformed cards or if no keyword
/// cards are found, or `ParseError::TooManyCards` if the limit is exceeded.
pub fn parse_header_text(text: &str) -> Result<Header, ParseError> {
    let mut builder = HeaderBuilder::default();

    'lines: for line in text.lines() {
        for card in split_cards(line) {
            if builder.push(parse_card(card)?)? {
                break 'lines;
            }
        }
    }

    let header = builder.finish();
    if header.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No header cards found".to_string(),
        ));
    }
    Ok(header)
}

/// A line longer than one card that is an exact multiple of 80 columns is
/// an unsplit header record; anything else is a single card.
fn split_cards(line: &str) -> Vec<&str> {
    use crate::utils::validation::CARD_LENGTH;

    if line.len() > CARD_LENGTH && line.len() % CARD_LENGTH == 0 && line.is_ascii() {
        (0..line.len() / CARD_LENGTH)
            .map(|i| &line[i * CARD_LENGTH..(i + 1) * CARD_LENGTH])
            .collect()
    } else {
        vec![line]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::header::{HeaderLookup, HeaderValue};

    #[test]
    fn test_parse_header_text() {
        let text = r"SIMPLE  =                    T / conforms to FITS standard
INSTRUME= 'ACS     '           / identifier for instrument used to acquire data
DETECTOR= 'WFC     '           / detector in use: WFC, HRC, or SBC
CCDTAB  = 'jref$xa81715gj_ccd.fits' / CCD calibration parameter table
DQICORR = 'PERFORM '           / data quality initialization
SNKCFILE= 'N/A     '
";
        let header = parse_header_text(text).unwrap();
        assert_eq!(header.get("INSTRUME").as_deref(), Some("ACS"));
        assert_eq!(header.get("DQICORR").as_deref(), Some("PERFORM"));
        assert_eq!(header.get("SNKCFILE").as_deref(), Some("N/A"));
        assert_eq!(header.value("SIMPLE"), Some(&HeaderValue::Logical(true)));
    }

    #[test]
    fn test_unpadded_keywords() {
        let header = parse_header_text("INSTRUME = 'WFC3'\nDETECTOR='IR'\n").unwrap();
        assert_eq!(header.get("INSTRUME").as_deref(), Some("WFC3"));
        assert_eq!(header.get("DETECTOR").as_deref(), Some("IR"));
    }

    #[test]
    fn test_stops_at_end() {
        let header = parse_header_text("A       = 1\nEND\nB       = 2\n").unwrap();
        assert!(header.has("A"));
        assert!(!header.has("B"));
    }

    #[test]
    fn test_single_line_record() {
        let line = format!("{:<80}{:<80}{:<80}", "INSTRUME= 'STIS'", "DETECTOR= 'CCD'", "END");
        let header = parse_header_text(&line).unwrap();
        assert_eq!(header.get("DETECTOR").as_deref(), Some("CCD"));
    }

    #[test]
    fn test_lone_trailing_ampersand() {
        let header = parse_header_text("CCDTAB  = 'jref$ccd&'\nDQICORR = 'PERFORM'\n").unwrap();
        assert_eq!(header.get("CCDTAB").as_deref(), Some("jref$ccd&"));

        let header = parse_header_text("CCDTAB  = 'jref$ccd&'\nCONTINUE  '_ccd.fits'\n").unwrap();
        assert_eq!(header.get("CCDTAB").as_deref(), Some("jref$ccd_ccd.fits"));
    }

    #[test]
    fn test_non_ascii_line() {
        assert!(matches!(
            parse_header_text("\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}= 1\n"),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_gzip_dump() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hdr.txt.gz");
        let mut encoder =
            GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"INSTRUME= 'COS'\nDETECTOR= 'FUV'\n").unwrap();
        encoder.finish().unwrap();

        let header = parse_header_file(&path).unwrap();
        assert_eq!(header.get("DETECTOR").as_deref(), Some("FUV"));
    }

    #[test]
    fn test_empty_text() {
        assert!(matches!(
            parse_header_text("\n# nothing here\n"),
            Err(ParseError::InvalidFormat(_))
        ));
    }
}
