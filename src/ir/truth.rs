//! Boolean value of a single constant, used by `if CONST goto L`.

use thiserror::Error;

use crate::ir::constant::{ConstValue, Constant};
use crate::ir::types::ValueType;

/// Truthiness failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TruthError {
    /// Only int, num, and string constants have a truth value.
    #[error("constant of type '{0}' has no truth value")]
    NotScalar(ValueType),
}

/// Returns the truth value of `constant`.
pub fn truthy(constant: &Constant) -> Result<bool, TruthError> {
    match &constant.value {
        ConstValue::Int(value) => Ok(*value != 0),
        ConstValue::Num(value) => Ok(*value != 0.0),
        ConstValue::String(value) => Ok(string_truthy(value)),
        ConstValue::Pmc(_) => Err(TruthError::NotScalar(ValueType::Pmc)),
    }
}

/// String truthiness: empty, `"0"`, `".0"`, `"0."`, and `"0.0"` are false.
pub fn string_truthy(value: &str) -> bool {
    !matches!(value, "" | "0" | ".0" | "0." | "0.0")
}
