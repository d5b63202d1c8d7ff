//! Parameter resolution
//!
//! Turns the loosely-typed parameter bag produced by upstream extraction into
//! typed values. Every accessor is best effort: malformed input reads as
//! "not provided" and never as an error, since extraction from free text is
//! noisy. Deciding that a field is *required* is the handler's job.

use crate::types::EntityId;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Closed enums that can be read from a parameter value
///
/// Matching ignores case, whitespace, `_` and `-`, so `"in progress"`,
/// `"IN_PROGRESS"` and `"InProgress"` all resolve to the same variant.
/// A bare ordinal (`"2"`) selects `VARIANTS[2]`.
pub trait ParamEnum: Sized + Copy + 'static {
    /// Variants in ordinal order
    const VARIANTS: &'static [Self];

    /// Canonical variant name
    fn name(self) -> &'static str;

    /// Parse a raw value
    fn parse_param(raw: &str) -> Option<Self> {
        let wanted = normalize_token(raw);
        if wanted.is_empty() {
            return None;
        }
        if let Ok(ordinal) = wanted.parse::<usize>() {
            return Self::VARIANTS.get(ordinal).copied();
        }
        Self::VARIANTS
            .iter()
            .copied()
            .find(|variant| normalize_token(variant.name()) == wanted)
    }
}

fn normalize_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Raw parameters extracted from a chat turn
///
/// Keys are case-sensitive. A missing key is distinct from an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterBag {
    values: HashMap<String, String>,
}

impl ParameterBag {
    /// Create empty bag
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[inline]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or overwrite a value
    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Whether the key is present (even with an empty value)
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of parameters
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the bag is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parameter names, unordered
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Raw value, empty strings preserved
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Raw value or a default
    #[inline]
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Trimmed value, `None` when missing or blank
    #[must_use]
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// First non-blank value among several aliases
    #[must_use]
    pub fn first_text(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get_text(key))
    }

    /// Integer value; a trailing `%` is tolerated
    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        let raw = self.get_text(key)?;
        strip_percent(raw).parse().ok()
    }

    /// Finite float value; a trailing `%` is tolerated
    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        let raw = self.get_text(key)?;
        strip_percent(raw)
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    /// Boolean value (`true/false`, `yes/no`, `y/n`, `1/0`)
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get_text(key)?.to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        }
    }

    /// Date or timestamp; date-only values resolve to midnight UTC
    #[must_use]
    pub fn get_date(&self, key: &str) -> Option<DateTime<Utc>> {
        parse_date(self.get_text(key)?)
    }

    /// Enum value, see [`ParamEnum`]
    #[must_use]
    pub fn get_enum<T: ParamEnum>(&self, key: &str) -> Option<T> {
        T::parse_param(self.get_text(key)?)
    }

    /// GUID value (hyphenated, simple or braced)
    #[must_use]
    pub fn get_guid(&self, key: &str) -> Option<Uuid> {
        let raw = self.get_text(key)?;
        let raw = raw
            .strip_prefix('{')
            .and_then(|r| r.strip_suffix('}'))
            .unwrap_or(raw);
        Uuid::parse_str(raw).ok()
    }

    /// GUID value as an entity identifier
    #[inline]
    #[must_use]
    pub fn get_id(&self, key: &str) -> Option<EntityId> {
        self.get_guid(key).map(EntityId::from)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<HashMap<String, String>> for ParameterBag {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

fn strip_percent(raw: &str) -> &str {
    raw.strip_suffix('%').map_or(raw, str::trim_end)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts.and_utc());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Color {
        Red,
        DeepBlue,
    }

    impl ParamEnum for Color {
        const VARIANTS: &'static [Self] = &[Color::Red, Color::DeepBlue];

        fn name(self) -> &'static str {
            match self {
                Color::Red => "Red",
                Color::DeepBlue => "DeepBlue",
            }
        }
    }

    fn bag(pairs: &[(&str, &str)]) -> ParameterBag {
        pairs.iter().copied().collect()
    }

    #[test]
    fn missing_and_empty_are_distinct() {
        let params = bag(&[("title", "")]);
        assert_eq!(params.get("title"), Some(""));
        assert_eq!(params.get("other"), None);
        assert!(params.contains("title"));
        assert_eq!(params.get_text("title"), None);
    }

    #[test]
    fn keys_are_case_sensitive() {
        let params = bag(&[("keyResultId", "x")]);
        assert_eq!(params.get("keyresultid"), None);
    }

    #[test]
    fn get_or_falls_back() {
        let params = bag(&[]);
        assert_eq!(params.get_or("status", "NotStarted"), "NotStarted");
    }

    #[test]
    fn first_text_skips_blank_aliases() {
        let params = bag(&[("title", "  "), ("keyResultTitle", "Ship v1")]);
        assert_eq!(params.first_text(&["title", "keyResultTitle"]), Some("Ship v1"));
    }

    #[test]
    fn ints_tolerate_noise() {
        let params = bag(&[("a", " 42 "), ("b", "75%"), ("c", "forty")]);
        assert_eq!(params.get_int("a"), Some(42));
        assert_eq!(params.get_int("b"), Some(75));
        assert_eq!(params.get_int("c"), None);
    }

    #[test]
    fn floats_reject_non_finite() {
        let params = bag(&[("a", "12.5"), ("b", "NaN"), ("c", "inf")]);
        assert_eq!(params.get_f64("a"), Some(12.5));
        assert_eq!(params.get_f64("b"), None);
        assert_eq!(params.get_f64("c"), None);
    }

    #[test]
    fn bools() {
        let params = bag(&[("a", "Yes"), ("b", "0"), ("c", "maybe")]);
        assert_eq!(params.get_bool("a"), Some(true));
        assert_eq!(params.get_bool("b"), Some(false));
        assert_eq!(params.get_bool("c"), None);
    }

    #[test]
    fn dates_in_several_formats() {
        let params = bag(&[
            ("iso", "2024-03-15"),
            ("us", "03/15/2024"),
            ("long", "March 15, 2024"),
            ("rfc", "2024-03-15T10:30:00+02:00"),
            ("local", "2024-03-15T10:30:00"),
            ("bad", "next tuesday"),
        ]);

        let iso = params.get_date("iso").unwrap();
        assert_eq!((iso.year(), iso.month(), iso.day(), iso.hour()), (2024, 3, 15, 0));
        assert_eq!(params.get_date("us"), Some(iso));
        assert_eq!(params.get_date("long"), Some(iso));
        assert_eq!(params.get_date("rfc").unwrap().hour(), 8);
        assert_eq!(params.get_date("local").unwrap().minute(), 30);
        assert_eq!(params.get_date("bad"), None);
    }

    #[test]
    fn enums_by_name_or_ordinal() {
        let params = bag(&[("a", "deep blue"), ("b", "DEEP_BLUE"), ("c", "0"), ("d", "7"), ("e", "green")]);
        assert_eq!(params.get_enum::<Color>("a"), Some(Color::DeepBlue));
        assert_eq!(params.get_enum::<Color>("b"), Some(Color::DeepBlue));
        assert_eq!(params.get_enum::<Color>("c"), Some(Color::Red));
        assert_eq!(params.get_enum::<Color>("d"), None);
        assert_eq!(params.get_enum::<Color>("e"), None);
    }

    #[test]
    fn guids() {
        let id = "6f9619ff-8b86-d011-b42d-00c04fc964ff";
        let params = bag(&[("a", id), ("b", "{6F9619FF-8B86-D011-B42D-00C04FC964FF}"), ("c", "t1")]);
        assert_eq!(params.get_guid("a").unwrap().to_string(), id);
        assert_eq!(params.get_guid("b"), params.get_guid("a"));
        assert_eq!(params.get_id("c"), None);
        assert_eq!(params.get_id("a").unwrap().as_str(), id);
    }

    #[test]
    fn bag_deserializes_from_plain_object() {
        let params: ParameterBag = serde_json::from_str(r#"{"title":"Draft spec"}"#).unwrap();
        assert_eq!(params.get("title"), Some("Draft spec"));
        assert_eq!(params.len(), 1);
    }

    proptest! {
        #[test]
        fn typed_accessors_never_panic(key in "[a-zA-Z]{1,8}", value in ".*") {
            let params = ParameterBag::new().with(key.clone(), value);
            let _ = params.get_int(&key);
            let _ = params.get_f64(&key);
            let _ = params.get_bool(&key);
            let _ = params.get_date(&key);
            let _ = params.get_guid(&key);
            let _ = params.get_enum::<Color>(&key);
        }

        #[test]
        fn ints_round_trip(n in any::<i64>()) {
            let params = ParameterBag::new().with("n", n.to_string());
            prop_assert_eq!(params.get_int("n"), Some(n));
        }
    }
}
