//! Label verification for a finished compilation unit.
//!
//! Branch operands name labels as plain strings. This pass checks that every
//! referenced label is defined in the same subroutine and that every label
//! table entry points at a statement slot.

use thiserror::Error;

use crate::ir::node::Statement;
use crate::ir::unit::{CompilationUnit, Subroutine};

// ===========================================================================
// Public API
// ===========================================================================

/// Verification failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerifyErrorKind {
    /// A branch names a label the subroutine does not define.
    UndefinedLabel,
    /// A label table entry points past the end of the statement list.
    LabelOutOfRange,
}

/// One verification failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct VerifyError {
    pub kind: VerifyErrorKind,
    /// Subroutine containing the problem.
    pub subroutine: String,
    pub label: String,
    /// Statement referencing the label, when there is one.
    pub statement: Option<usize>,
    pub message: String,
}

/// Checks every subroutine in `unit`, returning all failures in source order.
pub fn verify_unit(unit: &CompilationUnit) -> Vec<VerifyError> {
    let mut errors = Vec::new();
    for sub in &unit.subroutines {
        verify_subroutine(sub, &mut errors);
    }
    errors
}

// ===========================================================================
// Checks
// ===========================================================================

fn verify_subroutine(sub: &Subroutine, errors: &mut Vec<VerifyError>) {
    for (label, index) in &sub.labels {
        // A trailing label may point one past the last statement.
        if *index > sub.statements.len() {
            errors.push(VerifyError {
                kind: VerifyErrorKind::LabelOutOfRange,
                subroutine: sub.name.clone(),
                label: label.clone(),
                statement: None,
                message: format!(
                    "label '{label}' in '{}' points at statement {index} of {}",
                    sub.name,
                    sub.statements.len()
                ),
            });
        }
    }

    for (index, statement) in sub.statements.iter().enumerate() {
        let Statement::Instruction(instruction) = statement else {
            continue;
        };
        for label in instruction.label_operands() {
            if sub.labels.contains_key(label) {
                continue;
            }
            errors.push(VerifyError {
                kind: VerifyErrorKind::UndefinedLabel,
                subroutine: sub.name.clone(),
                label: label.to_string(),
                statement: Some(index),
                message: format!("label '{label}' referenced in '{}' is not defined", sub.name),
            });
        }
    }
}
