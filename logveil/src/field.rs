//! Typed key-value pairs attached to log entries.
//!
//! License: MIT OR APACHE 2.0

use logveil_core::Value;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: Value,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// A field whose value is any serializable type.
    pub fn serialized<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> Self {
        Self {
            key: key.into(),
            value: Value::from_serialize(value),
        }
    }
}

/// Shorthand for building a `Field`.
///
/// ```
/// use logveil::field;
/// let f = field!("user_id", 42);
/// assert_eq!(f.key, "user_id");
/// ```
#[macro_export]
macro_rules! field {
    ($key:expr, $value:expr) => {
        $crate::Field::new($key, $value)
    };
}
