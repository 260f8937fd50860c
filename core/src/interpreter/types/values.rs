//! Runtime value types

use crate::types::{Cube, UnitId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime value type
///
/// Every expression produces exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Value {
    Boolean(bool),
    Position(Cube),
    Unit(UnitId),
}

/// Discriminant of [`Value`], used for expected-kind checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Boolean,
    Position,
    Unit,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Position(_) => ValueKind::Position,
            Value::Unit(_) => ValueKind::Unit,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_position(&self) -> Option<Cube> {
        match self {
            Value::Position(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_unit(&self) -> Option<UnitId> {
        match self {
            Value::Unit(u) => Some(*u),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Position(c) => write!(f, "{}", c),
            Value::Unit(u) => write!(f, "{}", u),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Position => "position",
            ValueKind::Unit => "unit",
        };
        f.write_str(name)
    }
}
