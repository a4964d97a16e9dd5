//! Loggable value types.
//!
//! Every field in the registry is bound to exactly one [`LoggableType`] at
//! creation; writes of any other type to the same key are dropped.

use serde::{Deserialize, Serialize};

/// A type of log data that can be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoggableType {
    Raw,
    Boolean,
    Number,
    String,
    BooleanArray,
    NumberArray,
    StringArray,
}

/// A single typed value, tagged with its [`LoggableType`].
///
/// Equality is value equality for scalars and element-wise for `Raw` and
/// array variants, which is what the field-store dedup rule relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Raw(Vec<u8>),
    Boolean(bool),
    Number(f64),
    String(String),
    BooleanArray(Vec<bool>),
    NumberArray(Vec<f64>),
    StringArray(Vec<String>),
}

impl Value {
    /// The type tag this value carries.
    pub fn loggable_type(&self) -> LoggableType {
        match self {
            Value::Raw(_) => LoggableType::Raw,
            Value::Boolean(_) => LoggableType::Boolean,
            Value::Number(_) => LoggableType::Number,
            Value::String(_) => LoggableType::String,
            Value::BooleanArray(_) => LoggableType::BooleanArray,
            Value::NumberArray(_) => LoggableType::NumberArray,
            Value::StringArray(_) => LoggableType::StringArray,
        }
    }
}

impl LoggableType {
    /// The scalar element type of an array type, if this is an array type.
    pub fn element_type(&self) -> Option<LoggableType> {
        match self {
            LoggableType::BooleanArray => Some(LoggableType::Boolean),
            LoggableType::NumberArray => Some(LoggableType::Number),
            LoggableType::StringArray => Some(LoggableType::String),
            _ => None,
        }
    }
}
