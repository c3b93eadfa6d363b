//! Value and backend types shared by the drivers and the facade

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{KeyValError, Result};

/// A value as it crosses the storage boundary
///
/// Both backends persist the JSON text of the inner value, so anything that
/// round-trips through `serde_json` reads back identically on either one.
/// Absence is expressed as `Option::None` by the drivers; a stored JSON
/// `null` is `Some(StoredValue::null())`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredValue(Value);

impl StoredValue {
    /// Wrap a raw JSON value
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// A stored JSON `null`
    pub fn null() -> Self {
        Self(Value::Null)
    }

    /// Encode any serializable value
    ///
    /// # Errors
    /// Returns `KeyValError::Serialization` if the value can't be represented
    /// as JSON (e.g. maps with non-string keys).
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value).map(Self).map_err(KeyValError::from)
    }

    /// Decode into a concrete type
    ///
    /// # Errors
    /// Returns `KeyValError::Serialization` if the shape doesn't match `T`.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.0).map_err(KeyValError::from)
    }

    /// Borrow the inner JSON value
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Take the inner JSON value
    pub fn into_json(self) -> Value {
        self.0
    }

    /// Borrow as a string slice if the value is a JSON string
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Whether this is a stored JSON null (as opposed to an absent key)
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Serialize to the persisted text form
    ///
    /// # Errors
    /// Returns `KeyValError::Serialization` on encoder failure.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&self.0).map_err(KeyValError::from)
    }

    /// Parse the persisted text form
    ///
    /// # Errors
    /// Returns `KeyValError::Serialization` if `text` is not valid JSON.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map(Self).map_err(KeyValError::from)
    }
}

impl From<Value> for StoredValue {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<StoredValue> for Value {
    fn from(value: StoredValue) -> Self {
        value.0
    }
}

impl From<&str> for StoredValue {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_string()))
    }
}

impl From<String> for StoredValue {
    fn from(value: String) -> Self {
        Self(Value::String(value))
    }
}

impl From<bool> for StoredValue {
    fn from(value: bool) -> Self {
        Self(Value::Bool(value))
    }
}

impl From<i64> for StoredValue {
    fn from(value: i64) -> Self {
        Self(Value::from(value))
    }
}

impl From<f64> for StoredValue {
    fn from(value: f64) -> Self {
        Self(Value::from(value))
    }
}

impl fmt::Display for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which storage medium a facade is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Encrypted SQLCipher database
    Relational,
    /// Unencrypted host flat store
    Simple,
}

impl Backend {
    /// Lowercase name, as used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relational => "relational",
            Self::Simple => "simple",
        }
    }

    /// Whether this backend encrypts at rest
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Relational)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = KeyValError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relational" | "sqlcipher" | "sqlite" => Ok(Self::Relational),
            "simple" | "flat" | "localstorage" => Ok(Self::Simple),
            other => Err(KeyValError::Config(format!("Unknown backend: {other}"))),
        }
    }
}

/// One logical key with its value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Logical key, without any backend namespacing
    pub key: String,
    /// Stored value
    pub value: StoredValue,
}

impl Entry {
    /// Pair `key` with `value`
    pub fn new(key: impl Into<String>, value: impl Into<StoredValue>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}
