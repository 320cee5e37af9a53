//! Data types for Tabula
//!
//! This module defines the column types supported by the engine and the
//! descriptor that validates and casts loosely-typed input into them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::storage::Value;

/// Default VARCHAR length when none is given
pub const DEFAULT_VARCHAR_LENGTH: usize = 255;

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit signed integer
    Integer,
    /// Variable-length character string with max length (in characters)
    Varchar(usize),
    /// Double-precision floating point
    Float,
    /// Boolean type
    Boolean,
    /// Calendar date
    Date,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "INTEGER"),
            DataType::Varchar(n) => write!(f, "VARCHAR({})", n),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Date => write!(f, "DATE"),
        }
    }
}

/// Parses a type signature as produced by `Display` (`VARCHAR(20)`, `DATE`, ...)
impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let signature = s.trim().to_uppercase();
        match signature.as_str() {
            "INTEGER" | "INT" => Ok(DataType::Integer),
            "FLOAT" => Ok(DataType::Float),
            "BOOLEAN" | "BOOL" => Ok(DataType::Boolean),
            "DATE" => Ok(DataType::Date),
            "VARCHAR" => Ok(DataType::Varchar(DEFAULT_VARCHAR_LENGTH)),
            _ => {
                let len = signature
                    .strip_prefix("VARCHAR")
                    .map(str::trim)
                    .and_then(|rest| rest.strip_prefix('('))
                    .and_then(|rest| rest.strip_suffix(')'))
                    .and_then(|n| n.trim().parse::<usize>().ok())
                    .ok_or_else(|| Error::UnknownType(s.to_string()))?;
                Ok(DataType::Varchar(len))
            }
        }
    }
}

/// A type together with its nullability: the validate/cast contract of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub data_type: DataType,
    pub nullable: bool,
}

impl TypeDescriptor {
    /// Create a nullable descriptor
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            nullable: true,
        }
    }

    /// Set nullable flag
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Does `value` already conform to this descriptor?
    pub fn validate(&self, value: &Value) -> bool {
        match (self.data_type, value) {
            (_, Value::Null) => self.nullable,
            (DataType::Integer, Value::Integer(_)) => true,
            (DataType::Float, Value::Integer(_) | Value::Float(_)) => true,
            (DataType::Varchar(max), Value::String(s)) => s.chars().count() <= max,
            (DataType::Boolean, Value::Boolean(_)) => true,
            (DataType::Date, Value::Date(_)) => true,
            _ => false,
        }
    }

    /// Convert a loosely-typed value into the canonical representation.
    ///
    /// NULL into a non-nullable descriptor yields [`Error::NullValue`]; all
    /// other failures are type errors.
    pub fn cast(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return if self.nullable {
                Ok(Value::Null)
            } else {
                Err(Error::NullValue)
            };
        }

        match self.data_type {
            DataType::Integer => cast_integer(value),
            DataType::Varchar(max) => {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                let len = text.chars().count();
                if len > max {
                    return Err(Error::ValueTooLong { len, max });
                }
                Ok(Value::String(text))
            }
            DataType::Float => cast_float(value),
            DataType::Boolean => match value {
                Value::Boolean(b) => Ok(Value::Boolean(b)),
                Value::String(s) => Ok(Value::Boolean(matches!(
                    s.to_lowercase().as_str(),
                    "true" | "1" | "yes"
                ))),
                Value::Integer(i) => Ok(Value::Boolean(i != 0)),
                Value::Float(f) => Ok(Value::Boolean(f != 0.0)),
                other => Err(mismatch(&other, DataType::Boolean)),
            },
            DataType::Date => match value {
                Value::Date(d) => Ok(Value::Date(d)),
                Value::String(s) => Value::parse_date(&s).map(Value::Date),
                other => Err(mismatch(&other, DataType::Date)),
            },
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data_type)
    }
}

fn cast_integer(value: Value) -> Result<Value> {
    match value {
        Value::Integer(i) => Ok(Value::Integer(i)),
        Value::Float(f) if f.is_finite() && f.trunc().abs() < i64::MAX as f64 => {
            Ok(Value::Integer(f.trunc() as i64))
        }
        Value::String(ref s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| mismatch(&value, DataType::Integer)),
        other => Err(mismatch(&other, DataType::Integer)),
    }
}

fn cast_float(value: Value) -> Result<Value> {
    match value {
        Value::Integer(i) => Ok(Value::Float(i as f64)),
        Value::Float(f) => Ok(Value::Float(f)),
        Value::String(ref s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| mismatch(&value, DataType::Float)),
        other => Err(mismatch(&other, DataType::Float)),
    }
}

fn mismatch(value: &Value, to: DataType) -> Error {
    Error::TypeMismatch {
        from: format!("{} '{}'", value.type_name(), value),
        to: to.to_string(),
    }
}
