//! Diagnostic and error contracts for the PIR scanner.

use thiserror::Error;

use crate::lexer::span::Span;

/// Stable diagnostic codes emitted by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// A quoted string reached end of line or input before its closing quote.
    UnterminatedString,
    /// A byte that cannot start any token.
    InvalidCharacter,
    /// A numeric literal that does not fit its type or has no digits.
    MalformedNumber,
    /// A `$` not followed by a register class and number.
    MalformedRegister,
    /// A `:name` flag that PIR does not define.
    UnknownFlag,
}

/// User-facing diagnostic payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexDiagnostic {
    /// Machine-readable diagnostic code.
    pub code: DiagnosticCode,
    /// Human-readable message text.
    pub message: String,
    /// Source span associated with this diagnostic.
    pub span: Span,
}

impl LexDiagnostic {
    /// Creates a diagnostic value.
    pub fn new(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
        }
    }
}

/// Lexical error. The scanner has already skipped the offending text, so
/// scanning may resume with the next call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// Missing closing quote.
    #[error("{}", .0.message)]
    UnterminatedString(LexDiagnostic),
    /// Stray byte.
    #[error("{}", .0.message)]
    InvalidCharacter(LexDiagnostic),
    /// Bad numeric literal.
    #[error("{}", .0.message)]
    MalformedNumber(LexDiagnostic),
    /// Bad register name.
    #[error("{}", .0.message)]
    MalformedRegister(LexDiagnostic),
    /// Undefined `:flag`.
    #[error("{}", .0.message)]
    UnknownFlag(LexDiagnostic),
}

impl LexError {
    /// Builds the error variant matching `code`.
    pub fn from_code(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        let diagnostic = LexDiagnostic::new(code, message, span);
        match code {
            DiagnosticCode::UnterminatedString => Self::UnterminatedString(diagnostic),
            DiagnosticCode::InvalidCharacter => Self::InvalidCharacter(diagnostic),
            DiagnosticCode::MalformedNumber => Self::MalformedNumber(diagnostic),
            DiagnosticCode::MalformedRegister => Self::MalformedRegister(diagnostic),
            DiagnosticCode::UnknownFlag => Self::UnknownFlag(diagnostic),
        }
    }

    /// Returns the diagnostic carried by every variant.
    pub fn diagnostic(&self) -> &LexDiagnostic {
        match self {
            Self::UnterminatedString(diagnostic)
            | Self::InvalidCharacter(diagnostic)
            | Self::MalformedNumber(diagnostic)
            | Self::MalformedRegister(diagnostic)
            | Self::UnknownFlag(diagnostic) => diagnostic,
        }
    }

    /// Returns the source line of the error.
    pub fn line(&self) -> u32 {
        self.diagnostic().span.line
    }
}
