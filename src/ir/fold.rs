//! Compile-time evaluation of binary and relational operators over constants.
//!
//! Numeric pairs are int×int, num×int, int×num, and num×num; string×string is
//! the fifth supported pair. Anything involving a pmc constant, or mixing a
//! string with a number, does not fold.

use std::cmp::Ordering;

use thiserror::Error;

use crate::ir::constant::{ConstValue, Constant};
use crate::ir::operator::{BinaryOp, RelOp};
use crate::ir::types::ValueType;

/// Folding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FoldError {
    /// `div`, `fdiv`, or `mod` with a zero right operand.
    #[error("cannot divide by 0")]
    DivideByZero,
    /// The operator is undefined for the operand types.
    #[error("cannot apply binary operator '{op}' to types '{left}' and '{right}'")]
    UnsupportedOperator {
        op: &'static str,
        left: ValueType,
        right: ValueType,
    },
}

impl FoldError {
    fn unsupported(op: &'static str, left: &Constant, right: &Constant) -> Self {
        Self::UnsupportedOperator {
            op,
            left: left.value_type(),
            right: right.value_type(),
        }
    }
}

/// Folds `a op b` into a new unnamed constant. Inputs are not modified.
pub fn fold(a: &Constant, op: BinaryOp, b: &Constant) -> Result<Constant, FoldError> {
    let folded = match (&a.value, &b.value) {
        (ConstValue::Int(x), ConstValue::Int(y)) => fold_ints(*x, op, *y),
        (ConstValue::Int(_) | ConstValue::Num(_), ConstValue::Int(_) | ConstValue::Num(_)) => {
            match (a.as_num(), b.as_num()) {
                (Some(x), Some(y)) => fold_nums(x, op, y),
                _ => None,
            }
        }
        (ConstValue::String(x), ConstValue::String(y)) => fold_strings(x, op, y),
        _ => None,
    };

    match folded {
        Some(Ok(value)) => {
            log::debug!("folded {a} {op} {b} to {value}");
            Ok(Constant::new(value))
        }
        Some(Err(error)) => Err(error),
        None => Err(FoldError::unsupported(op.opcode(), a, b)),
    }
}

/// Evaluates `a op b` for the branching comparison family.
pub fn evaluate(a: &Constant, op: RelOp, b: &Constant) -> Result<bool, FoldError> {
    let ordering = match (&a.value, &b.value) {
        (ConstValue::String(x), ConstValue::String(y)) => Some(x.as_bytes().cmp(y.as_bytes())),
        (ConstValue::Int(_) | ConstValue::Num(_), ConstValue::Int(_) | ConstValue::Num(_)) => {
            match (a.as_num(), b.as_num()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            }
        }
        _ => return Err(FoldError::unsupported(op.opcode(), a, b)),
    };

    // NaN compares unequal to everything.
    let Some(ordering) = ordering else {
        return Ok(op == RelOp::Ne);
    };
    Ok(match op {
        RelOp::Ne => ordering != Ordering::Equal,
        RelOp::Eq => ordering == Ordering::Equal,
        RelOp::Lt => ordering == Ordering::Less,
        RelOp::Le => ordering != Ordering::Greater,
        RelOp::Gt => ordering == Ordering::Greater,
        RelOp::Ge => ordering != Ordering::Less,
    })
}

type Folded = Option<Result<ConstValue, FoldError>>;

fn fold_ints(a: i64, op: BinaryOp, b: i64) -> Folded {
    let value = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        // fdiv on two ints truncates like div.
        BinaryOp::Div | BinaryOp::FloorDiv => {
            if b == 0 {
                return Some(Err(FoldError::DivideByZero));
            }
            a.wrapping_div(b)
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Some(Err(FoldError::DivideByZero));
            }
            a.wrapping_rem(b)
        }
        BinaryOp::Pow => return Some(Ok(ConstValue::Num((a as f64).powf(b as f64)))),
        BinaryOp::BitOr => a | b,
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitXor | BinaryOp::Xor => a ^ b,
        BinaryOp::Shl => a.wrapping_shl(b as u32),
        BinaryOp::Shr => a.wrapping_shr(b as u32),
        BinaryOp::Lsr => (a as u64).wrapping_shr(b as u32) as i64,
        BinaryOp::Or => i64::from(a != 0 || b != 0),
        BinaryOp::And => i64::from(a != 0 && b != 0),
        BinaryOp::IsEq => i64::from(a == b),
        BinaryOp::IsLe => i64::from(a <= b),
        BinaryOp::IsLt => i64::from(a < b),
        BinaryOp::IsGe => i64::from(a >= b),
        BinaryOp::IsGt => i64::from(a > b),
        BinaryOp::IsNe => i64::from(a != b),
        BinaryOp::Concat => return None,
    };
    Some(Ok(ConstValue::Int(value)))
}

fn fold_nums(a: f64, op: BinaryOp, b: f64) -> Folded {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Some(Err(FoldError::DivideByZero));
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Some(Err(FoldError::DivideByZero));
            }
            (a / b).floor()
        }
        BinaryOp::Pow => a.powf(b),
        BinaryOp::Or => bool_to_num(a != 0.0 || b != 0.0),
        BinaryOp::And => bool_to_num(a != 0.0 && b != 0.0),
        BinaryOp::IsEq => return Some(Ok(ConstValue::Int(i64::from(a == b)))),
        BinaryOp::IsLe => return Some(Ok(ConstValue::Int(i64::from(a <= b)))),
        BinaryOp::IsLt => return Some(Ok(ConstValue::Int(i64::from(a < b)))),
        BinaryOp::IsGe => return Some(Ok(ConstValue::Int(i64::from(a >= b)))),
        BinaryOp::IsGt => return Some(Ok(ConstValue::Int(i64::from(a > b)))),
        BinaryOp::IsNe => return Some(Ok(ConstValue::Int(i64::from(a != b)))),
        BinaryOp::Mod
        | BinaryOp::Concat
        | BinaryOp::BitOr
        | BinaryOp::BitAnd
        | BinaryOp::BitXor
        | BinaryOp::Xor
        | BinaryOp::Shl
        | BinaryOp::Shr
        | BinaryOp::Lsr => return None,
    };
    Some(Ok(ConstValue::Num(value)))
}

fn fold_strings(a: &str, op: BinaryOp, b: &str) -> Folded {
    let ordering = a.as_bytes().cmp(b.as_bytes());
    let truth = match op {
        BinaryOp::Concat => return Some(Ok(ConstValue::String(format!("{a}{b}")))),
        BinaryOp::IsEq => ordering == Ordering::Equal,
        BinaryOp::IsLe => ordering != Ordering::Greater,
        BinaryOp::IsLt => ordering == Ordering::Less,
        BinaryOp::IsGe => ordering != Ordering::Less,
        BinaryOp::IsGt => ordering == Ordering::Greater,
        BinaryOp::IsNe => ordering != Ordering::Equal,
        _ => return None,
    };
    Some(Ok(ConstValue::Int(i64::from(truth))))
}

fn bool_to_num(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
