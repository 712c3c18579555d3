//! Peephole strength reduction of freshly emitted arithmetic instructions.

use crate::ir::constant::Constant;
use crate::ir::node::{Expression, Instruction};

/// Outcome of [`reduce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Nothing applied.
    Unchanged,
    /// The instruction was rewritten in place.
    Reduced,
    /// `div`/`fdiv` by a constant zero. The opcode is left as is for the
    /// caller to report.
    DivideByZero,
}

const REDUCIBLE: &[&str] = &["add", "sub", "mul", "div", "fdiv"];

/// Rewrites `instruction` into a cheaper equivalent where one exists:
///
/// - `op D, D, S` drops the repeated destination: `op D, S`.
/// - `add/sub D, 0` and `mul/div/fdiv D, 1` become `noop`.
/// - `add D, 1` and `sub D, 1` become `inc D` and `dec D`.
/// - `mul D, 0` becomes `null D`.
///
/// Applying it twice gives the same result as applying it once.
pub fn reduce(instruction: &mut Instruction) -> Reduction {
    let opcode = instruction.opcode.as_str();
    if !REDUCIBLE.contains(&opcode) {
        return Reduction::Unchanged;
    }

    let mut reduction = Reduction::Unchanged;
    if instruction.operand_count() > 2
        && same_target(instruction.operand(0), instruction.operand(1))
    {
        instruction.remove_operand(1);
        reduction = Reduction::Reduced;
    }

    if instruction.operand_count() != 2 {
        return reduction;
    }
    let Some(source) = instruction.operand(1).and_then(Expression::as_constant) else {
        return reduction;
    };
    if !is_numeric(source) {
        return reduction;
    }
    let zero = source.numeric_equals(0);
    let one = source.numeric_equals(1);

    let rewrite = match (instruction.opcode.as_str(), zero, one) {
        ("add" | "sub", true, _) => Rewrite::Noop,
        ("add", _, true) => Rewrite::KeepDestination("inc"),
        ("sub", _, true) => Rewrite::KeepDestination("dec"),
        ("mul", true, _) => Rewrite::KeepDestination("null"),
        ("mul" | "div" | "fdiv", _, true) => Rewrite::Noop,
        ("div" | "fdiv", true, _) => return Reduction::DivideByZero,
        _ => return reduction,
    };

    log::debug!("strength-reduced '{instruction}'");
    match rewrite {
        Rewrite::Noop => {
            instruction.set_opcode("noop");
            instruction.operands.clear();
        }
        Rewrite::KeepDestination(opcode) => {
            instruction.set_opcode(opcode);
            instruction.remove_operand(1);
        }
    }
    Reduction::Reduced
}

enum Rewrite {
    Noop,
    KeepDestination(&'static str),
}

fn same_target(first: Option<&Expression>, second: Option<&Expression>) -> bool {
    match (first, second) {
        (Some(Expression::Target(a)), Some(Expression::Target(b))) => a == b,
        _ => false,
    }
}

fn is_numeric(constant: &Constant) -> bool {
    constant.as_num().is_some()
}
