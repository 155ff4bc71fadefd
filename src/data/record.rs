//! Raw attribute records
//!
//! A record is what the table store hands back: a map of attribute
//! name to a tagged value. Typed models are built from these in
//! `mapper.rs`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute map of a single stored item
pub type Record = BTreeMap<String, AttributeValue>;

/// Name of the partition key attribute shared by every table
pub const KEY_ATTRIBUTE: &str = "id";

/// Tagged attribute value
///
/// Serializes in the DynamoDB JSON shape, e.g. `{"S":"u1"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// String
    S(String),
    /// Number, kept in its decimal string form
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Explicit null; stores write `true`
    #[serde(rename = "NULL")]
    Null(bool),
    /// List
    L(Vec<AttributeValue>),
    /// Nested map
    M(Record),
}

impl AttributeValue {
    /// Borrow the string payload, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::S(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::S(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::S(value)
    }
}

/// Read a string attribute from a record
pub fn string_attribute<'a>(record: &'a Record, name: &str) -> Option<&'a str> {
    record.get(name).and_then(AttributeValue::as_str)
}

/// Key of a record, if it carries a string `id`
pub fn record_key(record: &Record) -> Option<&str> {
    string_attribute(record, KEY_ATTRIBUTE)
}

/// Scan filter
///
/// A conjunction of attribute equalities. An empty filter matches every
/// record, which is how an unfiltered scan is expressed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, AttributeValue)>,
}

impl Filter {
    /// Filter that matches everything
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter on a single `attribute == value`
    pub fn equals(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::all().and_equals(attribute, value)
    }

    /// Add another equality condition
    pub fn and_equals(mut self, attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.conditions.push((attribute.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[(String, AttributeValue)] {
        &self.conditions
    }

    /// Evaluate the filter client-side
    ///
    /// Records missing a filtered attribute do not match.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(attribute, expected)| record.get(attribute) == Some(expected))
    }
}
