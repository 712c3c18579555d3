//! Statement-level error recovery.
//!
//! A syntax error abandons the current statement: it is reported through the
//! builder (and counted toward the error threshold), the rest of the line is
//! skipped, and parsing resumes at the next line.

use crate::ir::{Builder, Fatal};

use crate::parser::error::ParseError;
use crate::parser::token_stream::TokenStream;

/// Why a production failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// Recoverable by skipping to the next line.
    Syntax(ParseError),
    /// The build must stop.
    Fatal(Fatal),
}

impl From<ParseError> for ParseFailure {
    fn from(error: ParseError) -> Self {
        Self::Syntax(error)
    }
}

impl From<Fatal> for ParseFailure {
    fn from(fatal: Fatal) -> Self {
        Self::Fatal(fatal)
    }
}

/// Result of one grammar production.
pub type ParseResult<T> = Result<T, ParseFailure>;

/// Reports `error`, skips to the next line, and discards the partial
/// statement. Fails only when the report crosses the error threshold.
pub(crate) fn resynchronize(
    tokens: &mut TokenStream<'_>,
    builder: &mut Builder,
    error: &ParseError,
) -> Result<(), Fatal> {
    if let Some(line) = error.line() {
        builder.set_line(line);
    }
    builder.syntax_error(error.to_string())?;
    tokens.skip_line();
    builder.recover_statement();
    Ok(())
}
