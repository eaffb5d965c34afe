//! Wire payload types: the literal field/value maps sent to the trade pages.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

/// A single form or query value.
///
/// `Null` is rendered as an empty field when the payload is form-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(untagged)]
pub enum FormValue {
    /// Field present but unset.
    #[default]
    Null,
    /// Integer code or count.
    Int(i64),
    /// Price or percentage.
    Decimal(Decimal),
    /// Free text (symbols, names, tokens).
    Text(String),
}

impl FormValue {
    /// Check if the value is unset.
    pub fn is_null(&self) -> bool {
        matches!(self, FormValue::Null)
    }
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormValue::Null => Ok(()),
            FormValue::Int(value) => write!(f, "{}", value),
            FormValue::Decimal(value) => write!(f, "{}", value),
            FormValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for FormValue {
    fn from(value: i64) -> Self {
        FormValue::Int(value)
    }
}

impl From<u32> for FormValue {
    fn from(value: u32) -> Self {
        FormValue::Int(i64::from(value))
    }
}

impl From<Decimal> for FormValue {
    fn from(value: Decimal) -> Self {
        FormValue::Decimal(value)
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue::Text(value)
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_string())
    }
}

impl<T: Into<FormValue>> From<Option<T>> for FormValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// Ordered field-name → value map. Later inserts win on key collision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<&'static str, FormValue>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing any previous value.
    pub fn insert(&mut self, key: &'static str, value: impl Into<FormValue>) {
        self.0.insert(key, value.into());
    }

    /// Merge fields from an iterator, last write wins.
    pub fn merge<I, V>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<FormValue>,
    {
        for (key, value) in fields {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FormValue)> {
        self.0.iter().map(|(key, value)| (*key, value))
    }

    /// Render as `(key, value)` string pairs for form or query encoding.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }
}
