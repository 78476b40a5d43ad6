use std::borrow::Cow;
use tracing::{debug, warn};

use crate::core::header::{Header, HeaderValue};
use crate::parsing::fits::ParseError;
use crate::utils::validation::{check_card_limit, is_valid_keyword};

/// One header card of a text dump, classified
#[derive(Debug, Clone, PartialEq)]
pub enum Card {
    /// `KEYWORD = value / comment`
    Value { keyword: String, value: HeaderValue },
    /// Continuation of a long string value
    Continue(String),
    /// COMMENT, HISTORY, blank and any other card without a value
    Commentary,
    End,
}

/// Parse a single card.
///
/// Lines shorter than 80 characters are accepted, since dumps rarely keep
/// the padding.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for non-ASCII text or an unterminated
/// string value.
pub fn parse_card(card: &str) -> Result<Card, ParseError> {
    if !card.is_ascii() {
        return Err(ParseError::InvalidFormat(format!(
            "card is not ASCII: {}",
            card.trim_end()
        )));
    }
    let card = card.trim_end();
    // Dumps sometimes write `KEY = value` without padding the keyword to 8 columns
    let (key_field, rest) = match card.find('=') {
        Some(pos) if pos < 8 => card.split_at(pos),
        _ if card.len() > 8 => card.split_at(8),
        _ => (card, ""),
    };

    let keyword = key_field.trim();
    match keyword {
        "END" if rest.trim().is_empty() => return Ok(Card::End),
        "" | "COMMENT" | "HISTORY" => return Ok(Card::Commentary),
        "CONTINUE" => {
            let (value, _) = split_value_comment(rest)?;
            return Ok(Card::Continue(unquote(value).into_owned()));
        }
        _ => {}
    }

    let Some(field) = rest.trim_start().strip_prefix('=') else {
        return Ok(Card::Commentary);
    };

    let upper = keyword.to_ascii_uppercase();
    if !is_valid_keyword(&upper) {
        warn!(keyword, "Ignoring card with invalid keyword");
        return Ok(Card::Commentary);
    }

    let (value, _) = split_value_comment(field)?;
    Ok(Card::Value {
        keyword: upper,
        value: parse_value(value),
    })
}

/// Split a value field into the raw value and an optional comment.
///
/// Quoted strings may contain `/` and doubled quotes.
fn split_value_comment(field: &str) -> Result<(&str, Option<&str>), ParseError> {
    let s = field.trim();
    if let Some(body) = s.strip_prefix('\'') {
        let bytes = body.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                let comment = body[i + 1..]
                    .trim_start()
                    .strip_prefix('/')
                    .map(str::trim);
                return Ok((&s[..i + 2], comment));
            }
            i += 1;
        }
        Err(ParseError::InvalidFormat(format!(
            "unterminated string value: {s}"
        )))
    } else {
        Ok(match s.split_once('/') {
            Some((value, comment)) => (value.trim_end(), Some(comment.trim())),
            None => (s, None),
        })
    }
}

/// Strip the surrounding quotes of a string value, undo doubled quotes and
/// drop trailing blanks (not significant in FITS strings).
fn unquote(value: &str) -> Cow<'_, str> {
    match value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
    {
        Some(inner) if inner.contains("''") => {
            Cow::Owned(inner.replace("''", "'").trim_end().to_string())
        }
        Some(inner) => Cow::Borrowed(inner.trim_end()),
        None => Cow::Borrowed(value),
    }
}

/// Type a raw value field: quoted string, logical, integer, real (`D`
/// exponents included), or the bare text as a string.
pub(crate) fn parse_value(raw: &str) -> HeaderValue {
    if raw.starts_with('\'') {
        return HeaderValue::String(unquote(raw).into_owned());
    }
    match raw {
        "T" => return HeaderValue::Logical(true),
        "F" => return HeaderValue::Logical(false),
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        return HeaderValue::Integer(i);
    }
    if let Ok(r) = raw.replace('D', "E").parse::<f64>() {
        return HeaderValue::Real(r);
    }
    HeaderValue::String(raw.to_string())
}

/// Assembles parsed cards into a [`Header`], joining long-string continuations
#[derive(Debug, Default)]
pub(crate) struct HeaderBuilder {
    header: Header,
    /// Keyword whose string ends in `&` and may be continued by the next card
    pending: Option<String>,
    cards: usize,
}

impl HeaderBuilder {
    /// Add a card; returns `true` once the END card is seen
    pub(crate) fn push(&mut self, card: Card) -> Result<bool, ParseError> {
        if let Some(message) = check_card_limit(self.cards) {
            return Err(ParseError::TooManyCards(message));
        }
        self.cards += 1;

        match card {
            Card::End => return Ok(true),
            Card::Continue(part) => self.continue_string(&part),
            Card::Commentary => self.pending = None,
            Card::Value { keyword, value } => {
                self.pending = None;
                let may_continue = matches!(&value, HeaderValue::String(s) if s.ends_with('&'));
                if !self.header.insert(&keyword, value) {
                    debug!(%keyword, "Duplicate keyword, keeping first card");
                } else if may_continue {
                    self.pending = Some(keyword);
                }
            }
        }
        Ok(false)
    }

    /// The `&` of the previous part is only a continuation marker when a
    /// CONTINUE card actually follows it.
    fn continue_string(&mut self, part: &str) {
        let Some(keyword) = self.pending.take() else {
            warn!("CONTINUE card without a preceding long string, ignoring");
            return;
        };
        if let Some(HeaderValue::String(s)) = self.header.cards.get_mut(&keyword) {
            s.pop();
            s.push_str(part);
        }
        if part.ends_with('&') {
            self.pending = Some(keyword);
        }
    }

    pub(crate) fn finish(self) -> Header {
        self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(cards: &[&str]) -> Header {
        let mut builder = HeaderBuilder::default();
        for card in cards {
            if builder.push(parse_card(card).unwrap()).unwrap() {
                break;
            }
        }
        builder.finish()
    }

    #[test]
    fn test_parse_string_card() {
        let card = parse_card("CCDTAB  = 'jref$xa81715gj_ccd.fits   ' / CCD calibration parameter table").unwrap();
        assert_eq!(
            card,
            Card::Value {
                keyword: "CCDTAB".to_string(),
                value: HeaderValue::String("jref$xa81715gj_ccd.fits".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_doubled_quote_and_slash() {
        let card = parse_card("OBJECT  = 'O''Neil / field' / name").unwrap();
        assert_eq!(
            card,
            Card::Value {
                keyword: "OBJECT".to_string(),
                value: HeaderValue::String("O'Neil / field".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_numeric_and_logical() {
        let value = |s: &str| match parse_card(s).unwrap() {
            Card::Value { value, .. } => value,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(value("SIMPLE  =                    T"), HeaderValue::Logical(true));
        assert_eq!(value("NAXIS   =                    2 / axes"), HeaderValue::Integer(2));
        assert_eq!(value("EXPTIME =                 30.5"), HeaderValue::Real(30.5));
        assert_eq!(value("BIG     =               1.5D02"), HeaderValue::Real(150.0));
    }

    #[test]
    fn test_commentary_cards() {
        assert_eq!(parse_card("COMMENT  anything = here").unwrap(), Card::Commentary);
        assert_eq!(parse_card("HISTORY done").unwrap(), Card::Commentary);
        assert_eq!(parse_card("").unwrap(), Card::Commentary);
        assert_eq!(parse_card("END").unwrap(), Card::End);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            parse_card("CCDTAB  = 'oops"),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_non_ascii_card_rejected() {
        assert!(matches!(
            parse_card("OBSERVER= 'Jos\u{e9}'"),
            Err(ParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_card("\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}= 'x'"),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_continue_cards_join() {
        let header = build(&[
            "LONGSTR = 'jref$part_one&'",
            "CONTINUE  'part_two&'",
            "CONTINUE  '.fits'",
            "AFTER   = 'x'",
        ]);
        assert_eq!(
            header.value("LONGSTR"),
            Some(&HeaderValue::String("jref$part_onepart_two.fits".to_string()))
        );
        assert_eq!(header.value("AFTER").and_then(HeaderValue::as_str), Some("x"));
    }

    #[test]
    fn test_trailing_ampersand_without_continue() {
        let header = build(&["CCDTAB  = 'jref$ccd&'", "DETECTOR= 'WFC'"]);
        assert_eq!(
            header.value("CCDTAB").and_then(HeaderValue::as_str),
            Some("jref$ccd&")
        );

        let header = build(&["CCDTAB  = 'jref$ccd&'"]);
        assert_eq!(
            header.value("CCDTAB").and_then(HeaderValue::as_str),
            Some("jref$ccd&")
        );
    }

    #[test]
    fn test_last_part_keeps_ampersand() {
        let header = build(&["LONGSTR = 'a&'", "CONTINUE  'b&'", "END"]);
        assert_eq!(header.value("LONGSTR").and_then(HeaderValue::as_str), Some("ab&"));
    }

    #[test]
    fn test_duplicate_keyword_not_continued() {
        let header = build(&["A       = 'first'", "A       = 'second&'", "CONTINUE  'more'"]);
        assert_eq!(header.value("A").and_then(HeaderValue::as_str), Some("first"));
    }
}
