//! Typed reads over loosely structured job payloads.
//!
//! Producers outside this crate build payloads by hand, so numbers may
//! arrive as JSON strings and optional fields may be `null`.

use serde_json::{Map, Value};
use thiserror::Error;

/// Problems found while reading a payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// The payload is neither an object nor `null`.
    #[error("payload must be an object")]
    NotAnObject,

    /// A required field is absent, `null`, or blank.
    #[error("payload field '{0}' is required")]
    MissingField(&'static str),

    /// A field has the wrong shape.
    #[error("payload field '{field}' must be {expected}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Expected shape.
        expected: &'static str,
    },
}

/// Read-only view over a payload object.
#[derive(Debug, Clone, Copy)]
pub struct Payload<'a> {
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> Payload<'a> {
    /// Wraps a payload value; `null` reads as an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::NotAnObject`] for arrays and scalars.
    pub const fn new(value: &'a Value) -> Result<Self, PayloadError> {
        match value {
            Value::Object(fields) => Ok(Self {
                fields: Some(fields),
            }),
            Value::Null => Ok(Self { fields: None }),
            _ => Err(PayloadError::NotAnObject),
        }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.fields
            .and_then(|fields| fields.get(field))
            .filter(|value| !value.is_null())
    }

    /// Reads a non-negative integer, accepting numeric strings.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::InvalidField`] for other shapes.
    pub fn optional_u64(&self, field: &'static str) -> Result<Option<u64>, PayloadError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed.map(Some).ok_or(PayloadError::InvalidField {
            field,
            expected: "a non-negative integer",
        })
    }

    /// Reads a non-negative integer, falling back to `default`.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::InvalidField`] when present but malformed.
    pub fn u64_or(&self, field: &'static str, default: u64) -> Result<u64, PayloadError> {
        Ok(self.optional_u64(field)?.unwrap_or(default))
    }

    /// Reads a trimmed, non-blank string.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::InvalidField`] for non-string values.
    pub fn optional_str(&self, field: &'static str) -> Result<Option<&'a str>, PayloadError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(text)) => {
                let trimmed = text.trim();
                Ok((!trimmed.is_empty()).then_some(trimmed))
            }
            Some(_) => Err(PayloadError::InvalidField {
                field,
                expected: "a string",
            }),
        }
    }

    /// Reads a required string.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::MissingField`] when absent or blank.
    pub fn required_str(&self, field: &'static str) -> Result<&'a str, PayloadError> {
        self.optional_str(field)?
            .ok_or(PayloadError::MissingField(field))
    }

    /// Reads a string identifier that may also be sent as a number.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::InvalidField`] for other shapes.
    pub fn optional_id(&self, field: &'static str) -> Result<Option<String>, PayloadError> {
        match self.get(field) {
            Some(Value::Number(number)) => Ok(Some(number.to_string())),
            _ => Ok(self.optional_str(field)?.map(str::to_owned)),
        }
    }

    /// Reads a list of strings; a single string is a one-item list.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::InvalidField`] for non-string items.
    pub fn string_list(&self, field: &'static str) -> Result<Vec<String>, PayloadError> {
        let invalid = PayloadError::InvalidField {
            field,
            expected: "a list of strings",
        };
        match self.get(field) {
            None => Ok(Vec::new()),
            Some(Value::String(text)) => Ok(vec![text.trim().to_owned()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(|text| text.trim().to_owned())
                        .ok_or_else(|| invalid.clone())
                })
                .filter(|item| !matches!(item, Ok(text) if text.is_empty()))
                .collect(),
            Some(_) => Err(invalid),
        }
    }
}
