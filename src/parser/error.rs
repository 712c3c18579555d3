//! Parser error contracts.

use thiserror::Error;

use crate::lexer::{LexError, Span, Token};

/// Stable parser error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A concrete token did not match grammar expectations.
    UnexpectedToken,
    /// Input ended before required grammar elements were found.
    UnexpectedEndOfInput,
    /// Parser requested lookahead beyond the configured bound.
    LookaheadExceeded,
    /// Lexer error surfaced through the token stream.
    LexerError,
}

/// Parser error payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(*.kind, .expected, .found.as_deref()))]
pub struct ParseError {
    /// Error category.
    pub kind: ParseErrorKind,
    /// Optional source span near the failure.
    pub span: Option<Span>,
    /// Expected token labels.
    pub expected: Vec<String>,
    /// Found token/terminal label.
    pub found: Option<String>,
}

impl ParseError {
    /// Creates a parser error.
    pub fn new(
        kind: ParseErrorKind,
        span: Option<Span>,
        expected: Vec<String>,
        found: Option<String>,
    ) -> Self {
        Self {
            kind,
            span,
            expected,
            found,
        }
    }

    /// Creates an `UnexpectedToken` error.
    pub fn unexpected_token(
        token: &Token,
        expected: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            Some(token.span),
            expected.into_iter().map(Into::into).collect(),
            Some(token.describe()),
        )
    }

    /// Creates an `UnexpectedEndOfInput` error.
    pub fn unexpected_end_of_input(expected: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedEndOfInput,
            None,
            expected.into_iter().map(Into::into).collect(),
            Some("end of file".to_string()),
        )
    }

    /// Creates a `LookaheadExceeded` error.
    pub fn lookahead_exceeded(requested: usize, max: usize) -> Self {
        Self::new(
            ParseErrorKind::LookaheadExceeded,
            None,
            vec![format!("lookahead <= {max}")],
            Some(format!("lookahead {requested}")),
        )
    }

    /// Wraps a scanner error.
    pub fn lexer_error(error: &LexError) -> Self {
        let diagnostic = error.diagnostic();
        Self::new(
            ParseErrorKind::LexerError,
            Some(diagnostic.span),
            Vec::new(),
            Some(diagnostic.message.clone()),
        )
    }

    /// Returns the source line of the error, when known.
    pub fn line(&self) -> Option<u32> {
        self.span.map(|span| span.line)
    }
}

fn describe(kind: ParseErrorKind, expected: &[String], found: Option<&str>) -> String {
    let found = found.unwrap_or("input");
    match kind {
        ParseErrorKind::LexerError => found.to_string(),
        ParseErrorKind::LookaheadExceeded => format!("{found} exceeds {}", expected.join(", ")),
        ParseErrorKind::UnexpectedToken | ParseErrorKind::UnexpectedEndOfInput => {
            if expected.is_empty() {
                format!("syntax error, unexpected {found}")
            } else {
                format!(
                    "syntax error, unexpected {found}, expecting {}",
                    expected.join(" or ")
                )
            }
        }
    }
}
