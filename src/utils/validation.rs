//! Centralized validation and helper functions.

/// Length of a single FITS header card
pub const CARD_LENGTH: usize = 80;

/// Length of a FITS logical record
pub const BLOCK_LENGTH: usize = 2880;

/// Header size limit, in 2880-byte blocks
pub const MAX_HEADER_BLOCKS: usize = 1000;

/// Maximum number of cards accepted from any header source
pub const MAX_HEADER_CARDS: usize = MAX_HEADER_BLOCKS * (BLOCK_LENGTH / CARD_LENGTH);

/// Longest keyword allowed by the FITS standard
pub const MAX_KEYWORD_LENGTH: usize = 8;

/// Validate that a string is a legal FITS keyword (1-8 of `A-Z`, `0-9`, `-`, `_`).
///
/// # Examples
///
/// ```
/// use calref::utils::validation::is_valid_keyword;
///
/// assert!(is_valid_keyword("PCTECORR"));
/// assert!(is_valid_keyword("X1DCORR"));
/// assert!(!is_valid_keyword("pctecorr"));
/// assert!(!is_valid_keyword("TOOLONGKEY"));
/// ```
#[must_use]
pub fn is_valid_keyword(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_KEYWORD_LENGTH
        && s
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}

/// Upper-case and validate a keyword supplied by a user or a table file.
///
/// # Errors
///
/// Returns `ValidationError::EmptyKeyword` for blank input, or
/// `ValidationError::InvalidKeyword` if the normalized keyword is not legal.
pub fn normalize_keyword(s: &str) -> Result<String, ValidationError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyKeyword);
    }
    let upper = trimmed.to_ascii_uppercase();
    if is_valid_keyword(&upper) {
        Ok(upper)
    } else {
        Err(ValidationError::InvalidKeyword(trimmed.to_string()))
    }
}

/// Check if adding another card would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new card.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_card_limit(count: usize) -> Option<String> {
    if count >= MAX_HEADER_CARDS {
        Some(format!(
            "Too many header cards: adding another would exceed maximum of {MAX_HEADER_CARDS}"
        ))
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Empty keyword provided")]
    EmptyKeyword,
    #[error("Invalid FITS keyword '{0}': expected 1-{MAX_KEYWORD_LENGTH} characters of A-Z, 0-9, '-', '_'")]
    InvalidKeyword(String),
}
