//! PIR scanner.
//!
//! Produces one classified [`Token`] per call to [`Lexer::next_token`]. Each
//! newline is its own token because PIR statements are line-terminated.
//! Errors skip the offending text, so callers may keep scanning after one.

pub mod diagnostics;
pub mod span;
pub mod token;

mod cursor;
mod operator;
mod quote;
mod scanner;

use crate::lexer::cursor::Cursor;

pub use diagnostics::{DiagnosticCode, LexDiagnostic, LexError};
pub use span::{ByteOffset, SourceId, Span};
pub use token::{
    Directive, FlagKind, Keyword, LexStep, OperatorKind, RegisterClass, Token, TokenKind,
    TokenValue,
};

/// Scanner over one PIR source text.
pub struct Lexer<'a> {
    input: &'a str,
    source_id: SourceId,
    cursor: Cursor,
    previous: Option<TokenKind>,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer for `input` with source id `0`.
    pub fn new(input: &'a str) -> Self {
        Self::with_source(input, SourceId::new(0))
    }

    /// Creates a lexer tagging every span with `source_id`.
    pub fn with_source(input: &'a str, source_id: SourceId) -> Self {
        Self {
            input,
            source_id,
            cursor: Cursor::new(),
            previous: None,
        }
    }

    /// Returns the line the cursor is on.
    pub fn line(&self) -> u32 {
        self.cursor.line()
    }

    /// Scans and returns the next lexical step.
    pub fn next_token(&mut self) -> Result<LexStep, LexError> {
        let spaced = self.skip_trivia();
        if self.cursor.is_eof(self.input) {
            return Ok(LexStep::EndOfInput);
        }

        let token = self.scan(spaced);
        self.previous = token.as_ref().ok().map(|token| token.kind);
        token.map(LexStep::Token)
    }

    /// Scans the remaining input into a vector, stopping at the first error.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        while let LexStep::Token(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn scan(&mut self, spaced: bool) -> Result<Token, LexError> {
        let input = self.input;
        let source_id = self.source_id;
        let start = self.cursor.offset();
        let line = self.cursor.line();

        match self.cursor.peek_byte(input) {
            Some(b'\n') => {
                self.cursor.advance_byte(input);
                let span = Span::new(source_id, start, self.cursor.offset(), line);
                Ok(Token::new(TokenKind::Newline, "\n", span))
            }
            Some(b'"' | b'\'') => quote::scan_string(&mut self.cursor, input, source_id),
            Some(b'$') => scanner::scan_register(&mut self.cursor, input, source_id),
            Some(b':') if self.cursor.peek_nth(input, 1).is_some_and(scanner::is_word_start) => {
                scanner::scan_flag(&mut self.cursor, input, source_id)
            }
            Some(b'.') if self.cursor.peek_nth(input, 1).is_some_and(scanner::is_word_start) => {
                match scanner::scan_directive(&mut self.cursor, input, source_id) {
                    Some(token) => Ok(token),
                    None => self.scan_operator(),
                }
            }
            Some(byte) if scanner::is_word_start(byte) => {
                Ok(scanner::scan_word(&mut self.cursor, input, source_id))
            }
            Some(_) if scanner::starts_number(&self.cursor, input, self.sign_allowed(spaced)) => {
                scanner::scan_number(&mut self.cursor, input, source_id)
            }
            _ => self.scan_operator(),
        }
    }

    fn scan_operator(&mut self) -> Result<Token, LexError> {
        let input = self.input;
        let start = self.cursor.offset();
        let line = self.cursor.line();
        if let Some(scan) = operator::scan_operator(&mut self.cursor, input) {
            let span = Span::new(self.source_id, start, self.cursor.offset(), line);
            return Ok(Token::new(TokenKind::Operator(scan.kind), scan.lexeme, span));
        }

        let ch = self.cursor.advance_char(input).unwrap_or('\0');
        let span = Span::new(self.source_id, start, self.cursor.offset(), line);
        Err(LexError::from_code(
            DiagnosticCode::InvalidCharacter,
            format!("invalid character '{}'", ch.escape_default()),
            span,
        ))
    }

    /// A `-` directly before a digit is part of the literal when the previous
    /// token cannot end an operand (`$I0 = -1`, `foo(1, -2)`), or when it
    /// follows an opcode name with a space before and none after (`print -1`).
    fn sign_allowed(&self, spaced: bool) -> bool {
        match self.previous {
            None => true,
            Some(TokenKind::Operator(operator)) => operator.expects_operand(),
            Some(TokenKind::Identifier) => spaced,
            Some(
                TokenKind::Register(_)
                | TokenKind::IntConst
                | TokenKind::NumConst
                | TokenKind::StringConst,
            ) => false,
            Some(_) => true,
        }
    }

    /// Skips blanks and `#` comments. Returns `true` when anything was skipped.
    fn skip_trivia(&mut self) -> bool {
        let input = self.input;
        let before = self.cursor.offset();
        loop {
            match self.cursor.peek_byte(input) {
                Some(b' ' | b'\t' | b'\r' | b'\x0c') => {
                    self.cursor.advance_byte(input);
                }
                Some(b'#') => self.cursor.advance_while(input, |byte| byte != b'\n'),
                _ => break,
            }
        }
        self.cursor.offset() != before
    }
}
