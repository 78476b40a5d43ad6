use serde_json::Value;
use std::path::Path;

use crate::core::header::{Header, HeaderValue};
use crate::parsing::fits::ParseError;
use crate::parsing::read_text_file;
use crate::utils::validation::check_card_limit;

/// Parse a JSON header file, gzip-compressed or not
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_json_file(path: &Path) -> Result<Header, ParseError> {
    let content = read_text_file(path)?;
    Ok(parse_json_text(&content)?.with_source(path.display().to_string()))
}

/// Parse a header from a flat JSON object, e.g. `{"INSTRUME": "ACS", "NAXIS": 0}`.
///
/// Key order is preserved. `null` values are skipped.
///
/// # Errors
///
/// Returns `ParseError::Json` for malformed JSON, `ParseError::InvalidFormat`
/// if the document is not an object or holds nested values, or
/// `ParseError::TooManyCards` if the limit is exceeded.
pub fn parse_json_text(text: &str) -> Result<Header, ParseError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(map) = value else {
        return Err(ParseError::InvalidFormat(
            "JSON header must be an object of keyword/value pairs".to_string(),
        ));
    };

    let mut header = Header::new();
    for (keyword, value) in map {
        if let Some(message) = check_card_limit(header.len()) {
            return Err(ParseError::TooManyCards(message));
        }
        let value = match value {
            Value::Null => continue,
            Value::Bool(b) => HeaderValue::Logical(b),
            Value::String(s) => HeaderValue::String(s),
            Value::Number(n) => match n.as_i64() {
                Some(i) => HeaderValue::Integer(i),
                None => HeaderValue::Real(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::Array(_) | Value::Object(_) => {
                return Err(ParseError::InvalidFormat(format!(
                    "value of {keyword} must be a string, number or boolean"
                )));
            }
        };
        header.insert(&keyword, value);
    }
    Ok(header)
}
