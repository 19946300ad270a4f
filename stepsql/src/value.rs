//!
//! Dynamic column values.
//!
//! `Value` holds one column when the caller does not know the result shape
//! up front. Reading a `Value` looks at the column's declared SQL type,
//! maps it through `Kind::from_declared_type` and then performs the read
//! that kind calls for. A column whose declared type is missing or not in
//! the table reads as `Value::Null`.
//!

use std::fmt;

use crate::codec::{FromColumn, ToParam};
use crate::errors::Result;
use crate::kind::Kind;
use crate::row::{Binder, Row};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Integer(_) => Kind::Integer,
            Value::Float(_) => Kind::Float,
            Value::Text(_) => Kind::Text,
            Value::Blob(_) => Kind::Blob,
        }
    }

    /// Reads column `index`, picking the kind from its declared type.
    pub fn read(row: &Row<'_>, index: usize) -> Result<Value> {
        let declared = row.declared_type(index)?;
        let value = match Kind::from_declared_type(declared.as_deref()) {
            Kind::Null => Value::Null,
            Kind::Integer => Value::Integer(row.read_integer(index)?),
            Kind::Float => Value::Float(row.read_float(index)?),
            Kind::Text => Value::Text(row.read_text(index)?),
            Kind::Blob => Value::Blob(row.read_blob(index)?),
        };
        Ok(value)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(value) => Some(value),
            _ => None,
        }
    }
}

impl FromColumn for Value {
    const KIND: Kind = Kind::Null;

    fn from_column(row: &Row<'_>, index: usize) -> Result<Self> {
        Value::read(row, index)
    }
}

impl ToParam for Value {
    fn bind_param(&self, binder: &Binder<'_>, index: usize) -> Result<()> {
        match self {
            Value::Null => binder.bind_null(index),
            Value::Integer(value) => binder.bind_integer(index, *value),
            Value::Float(value) => binder.bind_float(index, *value),
            Value::Text(value) => binder.bind_text(index, value),
            Value::Blob(value) => binder.bind_blob(index, value),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Blob(value.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
            Value::Text(value) => f.write_str(value),
            Value::Blob(bytes) => {
                f.write_str("x'")?;
                for byte in bytes {
                    write!(f, "{:02X}", byte)?;
                }
                f.write_str("'")
            }
        }
    }
}
