use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// Semantic value kind of an attribute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "args", rename_all = "snake_case")]
pub enum ValueKind {
    Boolean,
    Character,
    Date,
    DateTime,
    OffsetDateTime,
    Time,
    Double,
    Decimal,
    Integer,
    Long,
    Short,
    String,
    ByteArray,
    /// Enumerated type with its declared constants.
    Enum(Vec<String>),
    /// Kind of a foreign-key attribute, the value is the referenced entity.
    Entity,
    /// A kind the generator does not know how to synthesize.
    Other(String),
}

impl ValueKind {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ValueKind::Double
                | ValueKind::Decimal
                | ValueKind::Integer
                | ValueKind::Long
                | ValueKind::Short
        )
    }

    pub fn name(&self) -> &str {
        match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Character => "character",
            ValueKind::Date => "date",
            ValueKind::DateTime => "date_time",
            ValueKind::OffsetDateTime => "offset_date_time",
            ValueKind::Time => "time",
            ValueKind::Double => "double",
            ValueKind::Decimal => "decimal",
            ValueKind::Integer => "integer",
            ValueKind::Long => "long",
            ValueKind::Short => "short",
            ValueKind::String => "string",
            ValueKind::ByteArray => "byte_array",
            ValueKind::Enum(_) => "enum",
            ValueKind::Entity => "entity",
            ValueKind::Other(name) => name.as_str(),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attribute value held by an [`Entity`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Boolean(bool),
    Character(char),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    OffsetDateTime(DateTime<FixedOffset>),
    Time(NaiveTime),
    Double(f64),
    Decimal(Decimal),
    Integer(i32),
    Long(i64),
    Short(i16),
    Text(String),
    Bytes(Vec<u8>),
    Enum(String),
    Entity(Box<Entity>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(value) => Some(value.as_slice()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(value) => Some(*value),
            Value::Integer(value) => Some(f64::from(*value)),
            Value::Long(value) => Some(*value as f64),
            Value::Short(value) => Some(f64::from(*value)),
            Value::Decimal(value) => value.to_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) | Value::Enum(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Whether this value may be stored in an attribute of the given kind.
    /// Null is accepted by every kind.
    pub fn matches_kind(&self, kind: &ValueKind) -> bool {
        match (self, kind) {
            (Value::Null, _) => true,
            (Value::Boolean(_), ValueKind::Boolean)
            | (Value::Character(_), ValueKind::Character)
            | (Value::Date(_), ValueKind::Date)
            | (Value::DateTime(_), ValueKind::DateTime)
            | (Value::OffsetDateTime(_), ValueKind::OffsetDateTime)
            | (Value::Time(_), ValueKind::Time)
            | (Value::Double(_), ValueKind::Double)
            | (Value::Decimal(_), ValueKind::Decimal)
            | (Value::Integer(_), ValueKind::Integer)
            | (Value::Long(_), ValueKind::Long)
            | (Value::Short(_), ValueKind::Short)
            | (Value::Text(_), ValueKind::String)
            | (Value::Bytes(_), ValueKind::ByteArray)
            | (Value::Entity(_), ValueKind::Entity) => true,
            (Value::Enum(value), ValueKind::Enum(constants)) => constants.contains(value),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Character(value) => write!(f, "{value:?}"),
            Value::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            Value::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S")),
            Value::OffsetDateTime(value) => write!(f, "{}", value.to_rfc3339()),
            Value::Time(value) => write!(f, "{}", value.format("%H:%M:%S")),
            Value::Double(value) => write!(f, "{value}"),
            Value::Decimal(value) => write!(f, "{value}"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Long(value) => write!(f, "{value}"),
            Value::Short(value) => write!(f, "{value}"),
            Value::Text(value) | Value::Enum(value) => f.write_str(value),
            Value::Bytes(value) => write!(f, "<{} bytes>", value.len()),
            Value::Entity(entity) => write!(f, "{}", entity.key()),
        }
    }
}
