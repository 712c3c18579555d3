//! Compile-time constant values.

use std::fmt;

use crate::ir::types::ValueType;

/// Tagged constant payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Num(f64),
    String(String),
    /// A pmc constant, initialized from a string (`.const pmc x = "Foo"`).
    Pmc(String),
}

impl ConstValue {
    /// Returns the type tag.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Int(_) => ValueType::Int,
            Self::Num(_) => ValueType::Num,
            Self::String(_) => ValueType::String,
            Self::Pmc(_) => ValueType::Pmc,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Num(value) => write!(f, "{value:?}"),
            Self::String(value) | Self::Pmc(value) => write!(f, "\"{}\"", value.escape_default()),
        }
    }
}

/// A constant, optionally bound to a name by `.const`/`.globalconst`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    /// Declared name, `None` for literals and fold results.
    pub name: Option<String>,
    /// Payload.
    pub value: ConstValue,
}

impl Constant {
    /// Creates an unnamed constant.
    pub fn new(value: ConstValue) -> Self {
        Self { name: None, value }
    }

    /// Creates a named constant.
    pub fn named(name: impl Into<String>, value: ConstValue) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }

    pub fn int(value: i64) -> Self {
        Self::new(ConstValue::Int(value))
    }

    pub fn num(value: f64) -> Self {
        Self::new(ConstValue::Num(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ConstValue::String(value.into()))
    }

    pub fn pmc(value: impl Into<String>) -> Self {
        Self::new(ConstValue::Pmc(value.into()))
    }

    /// Returns the type tag.
    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    /// Returns the payload of a numeric constant widened to `f64`.
    pub fn as_num(&self) -> Option<f64> {
        match self.value {
            ConstValue::Int(value) => Some(value as f64),
            ConstValue::Num(value) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` when the constant is an int or num equal to `value`.
    pub fn numeric_equals(&self, value: i64) -> bool {
        match self.value {
            ConstValue::Int(int) => int == value,
            ConstValue::Num(num) => num == value as f64,
            _ => false,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}
