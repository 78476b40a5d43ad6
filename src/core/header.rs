use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

/// Read access to a header's keyword/value pairs.
///
/// This is the whole surface the resolver needs. Anything that can answer
/// "is this keyword present" and "what is its value as text" can feed it.
pub trait HeaderLookup {
    /// Whether `keyword` is present
    fn has(&self, keyword: &str) -> bool;

    /// Value of `keyword` rendered as text, or `None` if absent
    fn get(&self, keyword: &str) -> Option<Cow<'_, str>>;
}

/// A single header value as stored in a FITS card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Logical(bool),
    Integer(i64),
    Real(f64),
    String(String),
}

impl HeaderValue {
    /// Render the value the way a FITS reader hands it back as a string
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::String(s) => Cow::Borrowed(s.as_str()),
            Self::Logical(true) => Cow::Borrowed("T"),
            Self::Logical(false) => Cow::Borrowed("F"),
            Self::Integer(i) => Cow::Owned(i.to_string()),
            Self::Real(r) => Cow::Owned(r.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for HeaderValue {
    fn from(b: bool) -> Self {
        Self::Logical(b)
    }
}

impl From<i64> for HeaderValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for HeaderValue {
    fn from(r: f64) -> Self {
        Self::Real(r)
    }
}

/// Primary header of a calibration image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Source file path (if known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Keyword/value pairs in card order
    pub cards: IndexMap<String, HeaderValue>,
}

impl Header {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Add a card as read from a file.
    ///
    /// Keywords are upper-cased. When a keyword repeats, the first card wins
    /// and `false` is returned.
    pub fn insert(&mut self, keyword: &str, value: impl Into<HeaderValue>) -> bool {
        let keyword = keyword.trim().to_ascii_uppercase();
        if self.cards.contains_key(&keyword) {
            return false;
        }
        self.cards.insert(keyword, value.into());
        true
    }

    /// Set a keyword, replacing any existing value but keeping its position
    pub fn set(&mut self, keyword: &str, value: impl Into<HeaderValue>) {
        self.cards
            .insert(keyword.trim().to_ascii_uppercase(), value.into());
    }

    #[must_use]
    pub fn value(&self, keyword: &str) -> Option<&HeaderValue> {
        self.cards.get(keyword.trim().to_ascii_uppercase().as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.cards.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl HeaderLookup for Header {
    fn has(&self, keyword: &str) -> bool {
        self.value(keyword).is_some()
    }

    fn get(&self, keyword: &str) -> Option<Cow<'_, str>> {
        self.value(keyword).map(HeaderValue::as_text)
    }
}

impl<S: std::hash::BuildHasher> HeaderLookup for HashMap<String, String, S> {
    fn has(&self, keyword: &str) -> bool {
        self.contains_key(keyword)
    }

    fn get(&self, keyword: &str) -> Option<Cow<'_, str>> {
        HashMap::get(self, keyword).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl HeaderLookup for BTreeMap<String, String> {
    fn has(&self, keyword: &str) -> bool {
        self.contains_key(keyword)
    }

    fn get(&self, keyword: &str) -> Option<Cow<'_, str>> {
        BTreeMap::get(self, keyword).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl<K: AsRef<str>, V: Into<HeaderValue>> FromIterator<(K, V)> for Header {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut header = Self::new();
        for (k, v) in iter {
            header.insert(k.as_ref(), v);
        }
        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_uppercases_keyword() {
        let mut header = Header::new();
        header.insert("ccdtab", "jref$x.fits");
        assert!(header.has("CCDTAB"));
        assert!(header.has("ccdtab"));
        assert_eq!(header.get("CCDTAB").as_deref(), Some("jref$x.fits"));
    }

    #[test]
    fn test_first_card_wins() {
        let mut header = Header::new();
        assert!(header.insert("DARKFILE", "first.fits"));
        assert!(!header.insert("DARKFILE", "second.fits"));
        assert_eq!(header.get("DARKFILE").as_deref(), Some("first.fits"));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut header: Header = [("A", "1"), ("B", "2"), ("C", "3")].into_iter().collect();
        header.set("B", "changed");
        let keys: Vec<&str> = header.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
        assert_eq!(header.get("B").as_deref(), Some("changed"));
    }

    #[test]
    fn test_non_string_values_as_text() {
        let mut header = Header::new();
        header.insert("SIMPLE", true);
        header.insert("NAXIS", 2_i64);
        header.insert("EXPTIME", 30.5_f64);
        assert_eq!(header.get("SIMPLE").as_deref(), Some("T"));
        assert_eq!(header.get("NAXIS").as_deref(), Some("2"));
        assert_eq!(header.get("EXPTIME").as_deref(), Some("30.5"));
    }

    #[test]
    fn test_absent_keyword() {
        let header = Header::new();
        assert!(!header.has("CCDTAB"));
        assert!(header.get("CCDTAB").is_none());
        assert!(header.is_empty());
    }

    #[test]
    fn test_hashmap_lookup() {
        let mut map = HashMap::new();
        map.insert("INSTRUME".to_string(), "ACS".to_string());
        assert!(HeaderLookup::has(&map, "INSTRUME"));
        assert_eq!(HeaderLookup::get(&map, "INSTRUME").as_deref(), Some("ACS"));
        assert!(HeaderLookup::get(&map, "DETECTOR").is_none());
    }

    #[test]
    fn test_serde_untagged_values() {
        let json = r#"{"cards":{"INSTRUME":"ACS","NAXIS":0,"SIMPLE":true,"EXPTIME":1.5}}"#;
        let header: Header = serde_json::from_str(json).unwrap();
        assert_eq!(header.value("NAXIS"), Some(&HeaderValue::Integer(0)));
        assert_eq!(header.value("SIMPLE"), Some(&HeaderValue::Logical(true)));
        assert_eq!(header.value("EXPTIME"), Some(&HeaderValue::Real(1.5)));
        assert_eq!(header.value("INSTRUME").and_then(HeaderValue::as_str), Some("ACS"));
    }
}
