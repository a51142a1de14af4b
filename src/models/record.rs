//! Record model
//!
//! A record is an opaque, typed key-value entity instance as held by a
//! record store. The engine never interprets attribute values beyond
//! copying them, comparing identities and rewriting references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Typed foreign key: the entity type and identity a value points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub entity_name: String,
    pub id: Uuid,
}

impl Reference {
    pub fn new(entity_name: impl Into<String>, id: Uuid) -> Self {
        Self {
            entity_name: entity_name.into(),
            id,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.entity_name, self.id)
    }
}

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum AttributeValue {
    Null,
    String(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    OptionSet(i32),
    Reference(Reference),
}

impl AttributeValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_option_set(&self) -> Option<i32> {
        match self {
            AttributeValue::OptionSet(v) => Some(*v),
            AttributeValue::Integer(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Identity carried by the value, for both bare GUIDs and references
    pub fn as_id(&self) -> Option<Uuid> {
        match self {
            AttributeValue::Guid(id) => Some(*id),
            AttributeValue::Reference(r) => Some(r.id),
            _ => None,
        }
    }

    /// Equality used by store filters.
    ///
    /// A reference matches a bare GUID (or another reference) when the
    /// identities are equal, so lookups by foreign key work with either form.
    pub fn matches(&self, other: &AttributeValue) -> bool {
        match (self.as_id(), other.as_id()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    /// Text rendering of the value, empty for `Null`
    pub fn display_text(&self) -> String {
        match self {
            AttributeValue::Null => String::new(),
            AttributeValue::String(s) => s.clone(),
            AttributeValue::Integer(v) => v.to_string(),
            AttributeValue::Decimal(v) => v.to_string(),
            AttributeValue::Boolean(v) => v.to_string(),
            AttributeValue::DateTime(v) => v.to_rfc3339(),
            AttributeValue::Guid(v) => v.to_string(),
            AttributeValue::OptionSet(v) => v.to_string(),
            AttributeValue::Reference(r) => r.id.to_string(),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Decimal(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Boolean(value)
    }
}

impl From<Uuid> for AttributeValue {
    fn from(value: Uuid) -> Self {
        AttributeValue::Guid(value)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttributeValue::DateTime(value)
    }
}

impl From<Reference> for AttributeValue {
    fn from(value: Reference) -> Self {
        AttributeValue::Reference(value)
    }
}

/// Which attributes a retrieve or query should return
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColumnSet {
    #[default]
    All,
    Columns(Vec<String>),
}

impl ColumnSet {
    pub fn columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnSet::Columns(names.into_iter().map(Into::into).collect())
    }

    pub fn includes(&self, name: &str) -> bool {
        match self {
            ColumnSet::All => true,
            ColumnSet::Columns(names) => names.iter().any(|n| n == name),
        }
    }
}

/// A typed entity instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub entity_name: String,
    /// Assigned by the store on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Record {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            id: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_id(entity_name: impl Into<String>, id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::new(entity_name)
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`Record::set`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Text of an attribute, or an empty string when absent
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(AttributeValue::display_text).unwrap_or_default()
    }

    pub fn to_reference(&self) -> Option<Reference> {
        self.id.map(|id| Reference::new(self.entity_name.clone(), id))
    }
}
