//! Byte cursor with line tracking.

use crate::lexer::span::ByteOffset;

/// Byte-position cursor over input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cursor {
    offset: ByteOffset,
    line: u32,
}

impl Cursor {
    /// Creates a cursor at byte offset `0`, line `1`.
    pub(crate) fn new() -> Self {
        Self {
            offset: ByteOffset::new(0),
            line: 1,
        }
    }

    /// Returns the current byte offset.
    pub(crate) fn offset(&self) -> ByteOffset {
        self.offset
    }

    /// Returns the current 1-based line.
    pub(crate) fn line(&self) -> u32 {
        self.line
    }

    /// Returns `true` if the cursor is at or beyond input end.
    pub(crate) fn is_eof(&self, input: &str) -> bool {
        self.offset.as_usize() >= input.len()
    }

    /// Returns the current byte at cursor position.
    pub(crate) fn peek_byte(&self, input: &str) -> Option<u8> {
        self.peek_nth(input, 0)
    }

    /// Returns the byte `n` positions past the cursor.
    pub(crate) fn peek_nth(&self, input: &str, n: usize) -> Option<u8> {
        input
            .as_bytes()
            .get(self.offset.as_usize().saturating_add(n))
            .copied()
    }

    /// Returns the current char, which may span several bytes.
    pub(crate) fn peek_char(&self, input: &str) -> Option<char> {
        input.get(self.offset.as_usize()..)?.chars().next()
    }

    /// Consumes one byte, counting newlines.
    pub(crate) fn advance_byte(&mut self, input: &str) -> Option<u8> {
        let byte = self.peek_byte(input)?;
        if byte == b'\n' {
            self.line = self.line.saturating_add(1);
        }
        self.offset = ByteOffset::from_usize(self.offset.as_usize() + 1);
        Some(byte)
    }

    /// Consumes one full char, counting newlines.
    pub(crate) fn advance_char(&mut self, input: &str) -> Option<char> {
        let ch = self.peek_char(input)?;
        if ch == '\n' {
            self.line = self.line.saturating_add(1);
        }
        self.offset = ByteOffset::from_usize(self.offset.as_usize() + ch.len_utf8());
        Some(ch)
    }

    /// Consumes bytes while `predicate` holds.
    pub(crate) fn advance_while(&mut self, input: &str, predicate: impl Fn(u8) -> bool) {
        while let Some(byte) = self.peek_byte(input) {
            if !predicate(byte) {
                break;
            }
            self.advance_byte(input);
        }
    }

    /// Returns the input text between `start` and the cursor.
    pub(crate) fn slice_from<'a>(&self, input: &'a str, start: ByteOffset) -> &'a str {
        input
            .get(start.as_usize()..self.offset.as_usize())
            .unwrap_or_default()
    }
}
