//! Lexer-backed parser token stream with bounded lookahead.

use std::collections::VecDeque;

use crate::lexer::{LexStep, Lexer, Token};

use crate::parser::error::ParseError;

/// Maximum supported lookahead index (`peek(0..=3)`).
pub const MAX_LOOKAHEAD: usize = 3;

/// Fixed-lookahead token stream over the lexer.
pub struct TokenStream<'a> {
    lexer: Lexer<'a>,
    lookahead: VecDeque<Token>,
    reached_end_of_input: bool,
}

impl<'a> TokenStream<'a> {
    /// Creates a stream from an existing lexer.
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            lexer,
            lookahead: VecDeque::new(),
            reached_end_of_input: false,
        }
    }

    /// Peeks a token by bounded lookahead index.
    ///
    /// `peek(0)` is the next token to be consumed by [`Self::next`].
    pub fn peek(&mut self, n: usize) -> Result<Option<&Token>, ParseError> {
        if n > MAX_LOOKAHEAD {
            return Err(ParseError::lookahead_exceeded(n, MAX_LOOKAHEAD));
        }

        self.fill_to(n)?;
        Ok(self.lookahead.get(n))
    }

    /// Consumes and returns the next token from the stream.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<Token>, ParseError> {
        self.fill_to(0)?;
        Ok(self.lookahead.pop_front())
    }

    /// Consumes and returns the next token when predicate matches.
    pub fn consume_if<P>(&mut self, predicate: P) -> Result<Option<Token>, ParseError>
    where
        P: Fn(&Token) -> bool,
    {
        let should_consume = match self.peek(0)? {
            Some(token) => predicate(token),
            None => false,
        };

        if should_consume {
            self.next()
        } else {
            Ok(None)
        }
    }

    /// Consumes one token and validates it with a predicate.
    pub fn expect<P>(
        &mut self,
        predicate: P,
        expected_label: impl Into<String>,
    ) -> Result<Token, ParseError>
    where
        P: Fn(&Token) -> bool,
    {
        let expected_label = expected_label.into();
        let Some(token) = self.next()? else {
            return Err(ParseError::unexpected_end_of_input([expected_label]));
        };

        if predicate(&token) {
            return Ok(token);
        }

        Err(ParseError::unexpected_token(&token, [expected_label]))
    }

    /// Drops buffered tokens and raw input up to and including the next
    /// newline. Returns `false` when input ended first.
    pub fn skip_line(&mut self) -> bool {
        while let Some(token) = self.lookahead.pop_front() {
            if token.is_newline() {
                return true;
            }
        }
        loop {
            match self.lexer.next_token() {
                Ok(LexStep::Token(token)) if token.is_newline() => return true,
                Ok(LexStep::Token(_)) | Err(_) => {}
                Ok(LexStep::EndOfInput) => {
                    self.reached_end_of_input = true;
                    return false;
                }
            }
        }
    }

    /// Line of the next token, or of the scanner position at end of input.
    pub fn line(&mut self) -> u32 {
        match self.peek(0) {
            Ok(Some(token)) => token.line(),
            _ => self.lexer.line(),
        }
    }

    fn fill_to(&mut self, index: usize) -> Result<(), ParseError> {
        while self.lookahead.len() <= index && !self.reached_end_of_input {
            match self.lexer.next_token() {
                Ok(LexStep::Token(token)) => self.lookahead.push_back(token),
                Ok(LexStep::EndOfInput) => self.reached_end_of_input = true,
                Err(error) => return Err(ParseError::lexer_error(&error)),
            }
        }

        Ok(())
    }
}
