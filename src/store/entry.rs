//! Entry Module
//!
//! Defines the metadata records kept for each stored value and the JSON shape tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Value Type ==
/// Shape of a stored JSON value, computed once at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Null,
    Array,
    Object,
    String,
    Number,
    Boolean,
}

impl ValueType {
    /// Tags a JSON value by its runtime shape.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Boolean,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }

    /// The tag as written to the `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Array => "array",
            ValueType::Object => "object",
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "null" => Ok(ValueType::Null),
            "array" => Ok(ValueType::Array),
            "object" => Ok(ValueType::Object),
            "string" => Ok(ValueType::String),
            "number" => Ok(ValueType::Number),
            "boolean" => Ok(ValueType::Boolean),
            other => Err(format!("unknown value type '{}'", other)),
        }
    }
}

// == Stored Value ==
/// A value read back from the store together with its tag.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub value: Value,
    pub value_type: ValueType,
}

// == Entry Metadata ==
/// Full metadata of an entry, without its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryMeta {
    pub key: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Label of the last writer
    pub agent: String,
    /// Creation timestamp (Unix milliseconds), kept across overwrites
    pub created_at: i64,
    pub updated_at: i64,
    pub accessed_at: i64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<i64>,
}

impl EntryMeta {
    /// Checks if the entry is expired at the given instant.
    ///
    /// An entry is expired once `now >= expires_at`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        is_expired_at(self.expires_at, now)
    }
}

// == Listed Entry ==
/// Row returned by `list`; a subset of [`EntryMeta`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedEntry {
    pub key: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub agent: String,
    pub updated_at: i64,
    pub expires_at: Option<i64>,
}

// == Set Outcome ==
/// Result of a successful `set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOutcome {
    pub key: String,
    /// UTF-8 byte length of the serialized value
    pub size: usize,
    /// Effective TTL in milliseconds, None when the entry never expires
    pub ttl: Option<u64>,
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Computes the expiration timestamp for a TTL in milliseconds.
///
/// A TTL of zero means the entry never expires.
pub fn expiry_from_ttl(now: i64, ttl_ms: Option<u64>) -> Option<i64> {
    ttl_ms
        .filter(|ttl| *ttl > 0)
        .map(|ttl| now.saturating_add(i64::try_from(ttl).unwrap_or(i64::MAX)))
}

pub(crate) fn is_expired_at(expires_at: Option<i64>, now: i64) -> bool {
    match expires_at {
        Some(expires) => now >= expires,
        None => false,
    }
}
