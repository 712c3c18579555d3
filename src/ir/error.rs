//! Diagnostics reported while building IR, and the fatal outcomes that stop
//! a build.

use thiserror::Error;

/// Stable diagnostic categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Malformed input reported by the recognizer or scanner.
    Syntax,
    /// A name declared twice in one scope.
    DuplicateSymbol,
    /// A name used without a declaration.
    UndeclaredSymbol,
    /// A declared name of the wrong type for its use.
    TypeMismatch,
    /// A constant operator with no meaning for its operand types.
    UnsupportedOperator,
    /// Constant division, floor division, or modulo by zero.
    DivideByZero,
    /// An identifier used as an opcode is not one.
    UnknownOpcode,
    /// A label defined twice in one subroutine.
    DuplicateLabel,
}

/// One recoverable error, tied to a source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: u32,
}

impl Diagnostic {
    /// Creates a diagnostic.
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, line: u32) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
        }
    }
}

/// Outcome that stops IR construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fatal {
    /// More errors than the configured threshold were reported.
    #[error("too many errors ({count}), compilation aborted")]
    TooManyErrors { count: usize },
    /// The builder reached a state its own checks should have ruled out.
    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Result of a builder action.
pub type BuildResult<T> = Result<T, Fatal>;
