//! Lowering of `if`/`unless` forms to branch instructions.

use crate::ir::node::{Expression, Instruction, Target};
use crate::ir::operator::RelOp;

/// Which keyword introduced the conditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// Jump when the condition holds.
    If,
    /// Jump when the condition does not hold.
    Unless,
}

impl Polarity {
    /// Returns `true` for `unless`.
    pub const fn is_inverted(self) -> bool {
        matches!(self, Self::Unless)
    }
}

/// Compile-time knowledge of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Only known when the program runs.
    Runtime,
    /// Known now.
    Constant(bool),
}

/// Lowers a condition with a known value to `branch L` or `noop`.
pub fn constant_branch(polarity: Polarity, value: bool, label: &str) -> Instruction {
    let taken = value != polarity.is_inverted();
    log::debug!(
        "resolved constant condition to {}",
        if taken { "branch" } else { "noop" }
    );
    if taken {
        let mut instruction = Instruction::new("branch");
        instruction.push_label(label);
        instruction
    } else {
        Instruction::new("noop")
    }
}

/// Lowers `if T goto L`, `unless null T goto L`, and the other variable
/// forms to `if`, `unless`, `if_null`, or `unless_null`.
pub fn variable_branch(
    polarity: Polarity,
    null_check: bool,
    target: Target,
    label: &str,
) -> Instruction {
    let opcode = match (polarity, null_check) {
        (Polarity::If, false) => "if",
        (Polarity::Unless, false) => "unless",
        (Polarity::If, true) => "if_null",
        (Polarity::Unless, true) => "unless_null",
    };
    let mut instruction = Instruction::new(opcode);
    instruction.push_target(target).push_label(label);
    instruction
}

/// Lowers `if A op B goto L`. `unless` inverts the comparison.
pub fn relational_branch(
    polarity: Polarity,
    op: RelOp,
    left: Expression,
    right: Expression,
    label: &str,
) -> Instruction {
    let op = if polarity.is_inverted() {
        op.inverted()
    } else {
        op
    };
    Instruction::with_operands(
        op.opcode(),
        [left, right, Expression::Label(label.to_string())],
    )
}
