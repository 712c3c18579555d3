//! Scalar value types.

use std::fmt;

use crate::lexer::{Keyword, RegisterClass};

/// Type of a symbol, register, or constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Num,
    /// Character string.
    String,
    /// Polymorphic container object.
    Pmc,
    /// Placeholder type given to symbols synthesized after a lookup failure.
    Unknown,
}

impl ValueType {
    /// Returns the PIR spelling used in declarations and diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Num => "num",
            Self::String => "string",
            Self::Pmc => "pmc",
            Self::Unknown => "unknown",
        }
    }

    /// Maps a type keyword (`int`, `num`, `string`, `pmc`).
    pub const fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Int => Some(Self::Int),
            Keyword::Num => Some(Self::Num),
            Keyword::String => Some(Self::String),
            Keyword::Pmc => Some(Self::Pmc),
            _ => None,
        }
    }

    /// Returns the register class letter, if the type has registers.
    pub const fn register_letter(self) -> Option<char> {
        match self {
            Self::Int => Some('I'),
            Self::Num => Some('N'),
            Self::String => Some('S'),
            Self::Pmc => Some('P'),
            Self::Unknown => None,
        }
    }

    pub(crate) const fn slot(self) -> usize {
        match self {
            Self::Int => 0,
            Self::Num => 1,
            Self::String => 2,
            Self::Pmc => 3,
            Self::Unknown => 4,
        }
    }
}

impl From<RegisterClass> for ValueType {
    fn from(class: RegisterClass) -> Self {
        match class {
            RegisterClass::Int => Self::Int,
            RegisterClass::Num => Self::Num,
            RegisterClass::String => Self::String,
            RegisterClass::Pmc => Self::Pmc,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
