//! Request DTOs for the state store
//!
//! Defines the structure of incoming HTTP request bodies and tool-call arguments.

use std::fmt;

use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::{Number, Value};

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The key to store the value under
/// - `value`: Any JSON value; an explicit `null` is a value, an absent field is not
/// - `ttl`: Optional TTL in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The entry key
    #[serde(default)]
    pub key: String,
    /// The value to store
    #[serde(default, deserialize_with = "present")]
    pub value: Option<Value>,
    /// Optional TTL in milliseconds
    #[serde(default, deserialize_with = "ttl_millis")]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("key is required".to_string());
        }
        if self.value.is_none() {
            return Some("value is required".to_string());
        }
        None
    }
}

/// Operation selected by a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Action {
    Get,
    Set,
    Del,
    List,
    Clear,
    Meta,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Get => "get",
            Action::Set => "set",
            Action::Del => "del",
            Action::List => "list",
            Action::Clear => "clear",
            Action::Meta => "meta",
        }
    }

    /// Every action, in the order the tool schema lists them.
    pub const ALL: [Action; 6] = [
        Action::Get,
        Action::Set,
        Action::Del,
        Action::List,
        Action::Clear,
        Action::Meta,
    ];
}

impl TryFrom<String> for Action {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| format!("Unknown action: {}", value))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Argument record of one state tool call.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolRequest {
    pub action: Action,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub value: Option<Value>,
    /// TTL in milliseconds (set only)
    #[serde(default, deserialize_with = "ttl_millis")]
    pub ttl: Option<u64>,
}

impl ToolRequest {
    /// Convenience constructor for an action without arguments.
    pub fn new(action: Action) -> Self {
        Self {
            action,
            key: None,
            value: None,
            ttl: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

// Keeps an explicit `null` as Some(Value::Null); only a missing field is None.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// Callers often emit JSON numbers as floats (60000.0); a whole float is accepted.
fn ttl_millis<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(ms) = number.as_u64() {
        return Ok(Some(ms));
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 => {
            Ok(Some(f as u64))
        }
        _ => Err(D::Error::custom(
            "ttl must be a non-negative whole number of milliseconds",
        )),
    }
}
