// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * An in-memory FITS header: an ordered list of keyword cards.
 */

use std::fmt;

use super::error::FitsError;

/// The value of a FITS header card.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A keyword present without a value (e.g. "TARGET  =").
    Undefined,
    Logical(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Parse a value string as returned by cfitsio (e.g. from `ffgkyn`).
    /// Strings are quoted, logicals are T or F, and floats may use a D
    /// exponent. Anything unrecognised is kept verbatim as text.
    pub fn parse_fits(raw: &str) -> Value {
        let raw = raw.trim();
        if raw.is_empty() {
            return Value::Undefined;
        }

        if let Some(quoted) = raw.strip_prefix('\'') {
            let inner = quoted.strip_suffix('\'').unwrap_or(quoted);
            return Value::Text(inner.replace("''", "'").trim_end().to_string());
        }

        match raw {
            "T" => return Value::Logical(true),
            "F" => return Value::Logical(false),
            _ => (),
        }

        if let Ok(i) = raw.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = raw.replace('D', "E").replace('d', "e").parse::<f64>() {
            return Value::Float(f);
        }
        Value::Text(raw.to_string())
    }

    /// Parse a value given on the command line. Integers are tried first,
    /// then floats, then "true"/"false"; everything else is a string.
    pub fn parse_cli(raw: &str) -> Value {
        if let Ok(i) = raw.parse::<i64>() {
            Value::Integer(i)
        } else if let Ok(f) = raw.parse::<f64>() {
            Value::Float(f)
        } else if raw.eq_ignore_ascii_case("true") {
            Value::Logical(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Value::Logical(false)
        } else {
            Value::Text(raw.to_string())
        }
    }

    /// Equality that treats integers and floats with the same numeric value
    /// as the same.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// A short name for the type of this value, used in messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Logical(_) => "logical",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Undefined => Ok(()),
            Value::Logical(true) => write!(f, "T"),
            Value::Logical(false) => write!(f, "F"),
            Value::Integer(i) => write!(f, "{}", i),
            // Debug formatting keeps the decimal point and uses exponents for
            // small numbers, e.g. "200.0" and "1e-7".
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Logical(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(u: usize) -> Self {
        Value::Integer(u as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// A single header card.
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub keyword: String,
    pub value: Value,
    /// For commentary cards (COMMENT, HISTORY, blank), this holds the text.
    pub comment: Option<String>,
}

impl Card {
    pub fn new<K: Into<String>, V: Into<Value>>(keyword: K, value: V) -> Card {
        Card {
            keyword: keyword.into(),
            value: value.into(),
            comment: None,
        }
    }

    pub fn commentary<K: Into<String>, T: Into<String>>(keyword: K, text: T) -> Card {
        Card {
            keyword: keyword.into(),
            value: Value::Undefined,
            comment: Some(text.into()),
        }
    }

    pub fn is_commentary(&self) -> bool {
        is_commentary_keyword(&self.keyword)
    }
}

pub fn is_commentary_keyword(keyword: &str) -> bool {
    matches!(keyword, "COMMENT" | "HISTORY" | "")
}

/// An ordered collection of header cards. Non-commentary keywords are unique.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    pub fn new() -> Header {
        Header::default()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    fn position(&self, keyword: &str) -> Option<usize> {
        self.cards
            .iter()
            .position(|c| !c.is_commentary() && c.keyword == keyword)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.position(keyword).is_some()
    }

    pub fn get(&self, keyword: &str) -> Option<&Value> {
        self.position(keyword).map(|i| &self.cards[i].value)
    }

    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        self.get(keyword).and_then(|v| v.as_str())
    }

    pub fn get_f64(&self, keyword: &str) -> Option<f64> {
        self.get(keyword).and_then(|v| v.as_f64())
    }

    pub fn get_i64(&self, keyword: &str) -> Option<i64> {
        match self.get(keyword) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn comment(&self, keyword: &str) -> Option<&str> {
        self.position(keyword)
            .and_then(|i| self.cards[i].comment.as_deref())
    }

    /// Set the value of a keyword. An existing card keeps its position and
    /// comment; otherwise a new card is appended.
    pub fn set<K: Into<String>, V: Into<Value>>(&mut self, keyword: K, value: V) {
        let keyword = keyword.into();
        match self.position(&keyword) {
            Some(i) => self.cards[i].value = value.into(),
            None => self.cards.push(Card::new(keyword, value)),
        }
    }

    /// Set the comment of an existing keyword. Returns false if the keyword
    /// isn't present.
    pub fn set_comment<T: Into<String>>(&mut self, keyword: &str, comment: T) -> bool {
        match self.position(keyword) {
            Some(i) => {
                self.cards[i].comment = Some(comment.into());
                true
            }
            None => false,
        }
    }

    /// Append a card. A non-commentary card replaces any card with the same
    /// keyword.
    pub fn push(&mut self, card: Card) {
        if !card.is_commentary() {
            if let Some(i) = self.position(&card.keyword) {
                self.cards[i] = card;
                return;
            }
        }
        self.cards.push(card);
    }

    pub fn remove(&mut self, keyword: &str) -> Option<Card> {
        self.position(keyword).map(|i| self.cards.remove(i))
    }

    pub fn retain<F: FnMut(&Card) -> bool>(&mut self, f: F) {
        self.cards.retain(f)
    }

    /// The non-commentary keywords, in order.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.cards
            .iter()
            .filter(|c| !c.is_commentary())
            .map(|c| c.keyword.as_str())
    }

    /// Merge multiple headers. Keywords appearing in more than one header
    /// must have the same value. Commentary cards are concatenated, dropping
    /// exact duplicates.
    pub fn merge(headers: &[&Header]) -> Result<Header, FitsError> {
        let mut merged = Header::new();
        for header in headers {
            for card in &header.cards {
                if card.is_commentary() {
                    if !merged.cards.contains(card) {
                        merged.cards.push(card.clone());
                    }
                    continue;
                }

                if let Some(current) = merged.get(&card.keyword) {
                    if !current.same_as(&card.value) {
                        return Err(FitsError::MergeConflict {
                            keyword: card.keyword.clone(),
                            left: format!("{:?}", current),
                            right: format!("{:?}", card.value),
                        });
                    }
                    continue;
                }
                merged.cards.push(card.clone());
            }
        }
        Ok(merged)
    }
}

/// Is this a legal (short) FITS keyword?
pub fn is_valid_keyword(keyword: &str) -> bool {
    !keyword.is_empty()
        && keyword.len() <= 8
        && keyword
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

/// Parse a "KEY=VALUE" command-line argument. The keyword is upper-cased.
pub fn parse_keyword_arg(arg: &str) -> Result<(String, Value), FitsError> {
    let (key, value) = match arg.split_once('=') {
        Some(kv) => kv,
        None => return Err(FitsError::MissingValue(arg.to_string())),
    };
    let key = key.trim().to_ascii_uppercase();
    if !is_valid_keyword(&key) {
        return Err(FitsError::BadKeyword(key));
    }
    Ok((key, Value::parse_cli(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fits_values() {
        assert_eq!(Value::parse_fits(""), Value::Undefined);
        assert_eq!(Value::parse_fits("T"), Value::Logical(true));
        assert_eq!(Value::parse_fits("F"), Value::Logical(false));
        assert_eq!(Value::parse_fits("200"), Value::Integer(200));
        assert_eq!(Value::parse_fits("-3"), Value::Integer(-3));
        assert_eq!(Value::parse_fits("1.0E-07"), Value::Float(1e-7));
        assert_eq!(Value::parse_fits("2.5D3"), Value::Float(2500.0));
        assert_eq!(
            Value::parse_fits("'mem_prior'"),
            Value::Text("mem_prior".to_string())
        );
        assert_eq!(
            Value::parse_fits("'IMAGE-OI INITIAL IMAGE'"),
            Value::Text("IMAGE-OI INITIAL IMAGE".to_string())
        );
        // Trailing blanks are not significant, quotes are doubled.
        assert_eq!(
            Value::parse_fits("'it''s     '"),
            Value::Text("it's".to_string())
        );
        assert_eq!(
            Value::parse_fits("(1.0, 2.0)"),
            Value::Text("(1.0, 2.0)".to_string())
        );
    }

    #[test]
    fn test_parse_cli_values() {
        assert_eq!(Value::parse_cli("50"), Value::Integer(50));
        assert_eq!(Value::parse_cli("0.467"), Value::Float(0.467));
        assert_eq!(Value::parse_cli("1e5"), Value::Float(1e5));
        assert_eq!(Value::parse_cli("TRUE"), Value::Logical(true));
        assert_eq!(Value::parse_cli("false"), Value::Logical(false));
        assert_eq!(Value::parse_cli("foo"), Value::Text("foo".to_string()));
        // "T" could be a perfectly good target name.
        assert_eq!(Value::parse_cli("T"), Value::Text("T".to_string()));
    }

    #[test]
    fn test_parse_keyword_arg() {
        let (k, v) = parse_keyword_arg("MAXITER=50").unwrap();
        assert_eq!(k, "MAXITER");
        assert_eq!(v, Value::Integer(50));

        let (k, v) = parse_keyword_arg("mykey2=foo").unwrap();
        assert_eq!(k, "MYKEY2");
        assert_eq!(v, Value::Text("foo".to_string()));

        // Only the first '=' splits.
        let (k, v) = parse_keyword_arg("RGL_NAME=a=b").unwrap();
        assert_eq!(k, "RGL_NAME");
        assert_eq!(v, Value::Text("a=b".to_string()));

        assert!(matches!(
            parse_keyword_arg("MAXITER"),
            Err(FitsError::MissingValue(_))
        ));
        assert!(matches!(
            parse_keyword_arg("WAYTOOLONGKEY=1"),
            Err(FitsError::BadKeyword(_))
        ));
        assert!(matches!(
            parse_keyword_arg("=1"),
            Err(FitsError::BadKeyword(_))
        ));
        assert!(matches!(
            parse_keyword_arg("BAD KEY=1"),
            Err(FitsError::BadKeyword(_))
        ));
    }

    #[test]
    fn test_set_keeps_position_and_comment() {
        let mut h = Header::new();
        h.set("MAXITER", 200);
        h.set("FLUX", 1.0);
        assert!(h.set_comment("MAXITER", "Maximum number of iterations to run"));
        h.set("MAXITER", 50);

        assert_eq!(h.keywords().collect::<Vec<_>>(), vec!["MAXITER", "FLUX"]);
        assert_eq!(h.get_i64("MAXITER"), Some(50));
        assert_eq!(
            h.comment("MAXITER"),
            Some("Maximum number of iterations to run")
        );
        assert!(!h.set_comment("NOTHERE", "x"));
    }

    #[test]
    fn test_commentary_cards_are_not_keywords() {
        let mut h = Header::new();
        h.push(Card::commentary("HISTORY", "first"));
        h.push(Card::commentary("HISTORY", "second"));
        h.set("TELESCOP", "CHARA");
        assert_eq!(h.len(), 3);
        assert_eq!(h.keywords().collect::<Vec<_>>(), vec!["TELESCOP"]);
        assert!(h.get("HISTORY").is_none());
    }

    #[test]
    fn test_merge() {
        let mut a = Header::new();
        a.set("TELESCOP", "CHARA");
        a.push(Card::commentary("HISTORY", "a first history line"));
        a.push(Card::commentary("HISTORY", "a second history line"));
        let mut b = Header::new();
        b.set("TELESCOP", "CHARA");
        b.set("HDUNAME", crate::INIT_IMG_NAME);
        b.push(Card::commentary("HISTORY", "b only history line"));
        b.push(Card::commentary("HISTORY", "a first history line"));

        let c = Header::merge(&[&a, &b]).unwrap();
        assert_eq!(c.get_str("TELESCOP"), Some("CHARA"));
        assert_eq!(c.get_str("HDUNAME"), Some(crate::INIT_IMG_NAME));
        let num_history = c.cards().iter().filter(|c| c.keyword == "HISTORY").count();
        assert_eq!(num_history, 3);
    }

    #[test]
    fn test_merge_numeric_equivalence() {
        let mut a = Header::new();
        a.set("EQUINOX", 2000);
        let mut b = Header::new();
        b.set("EQUINOX", 2000.0);
        assert!(Header::merge(&[&a, &b]).is_ok());
    }

    #[test]
    fn test_merge_conflict() {
        let mut a = Header::new();
        a.set("TELESCOP", "CHARA");
        let mut b = Header::new();
        b.set("TELESCOP", "IOTA");
        let result = Header::merge(&[&a, &b]);
        match result {
            Err(FitsError::MergeConflict { keyword, .. }) => assert_eq!(keyword, "TELESCOP"),
            _ => panic!("Expected a merge conflict"),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Value::Float(1e-7)), "1e-7");
        assert_eq!(format!("{}", Value::Float(200.0)), "200.0");
        assert_eq!(format!("{}", Value::Integer(200)), "200");
        assert_eq!(format!("{}", Value::Logical(true)), "T");
        assert_eq!(format!("{}", Value::Undefined), "");
        assert_eq!(format!("{}", Value::from("ALL")), "ALL");
    }
}
