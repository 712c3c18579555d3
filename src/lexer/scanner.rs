//! Scanners for words, numbers, and registers.

use crate::lexer::cursor::Cursor;
use crate::lexer::diagnostics::{DiagnosticCode, LexError};
use crate::lexer::span::{SourceId, Span};
use crate::lexer::token::{
    Directive, FlagKind, Keyword, RegisterClass, Token, TokenKind, TokenValue,
};

pub(crate) fn is_word_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

pub(crate) fn is_word_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Scans an identifier, keyword, or `name:` label.
pub(crate) fn scan_word(cursor: &mut Cursor, input: &str, source_id: SourceId) -> Token {
    let start = cursor.offset();
    let line = cursor.line();
    cursor.advance_while(input, is_word_continue);
    let word = cursor.slice_from(input, start);

    // `L1:` is a label, `x :flag` and `x::y` are not.
    let is_label = cursor.peek_byte(input) == Some(b':')
        && !cursor
            .peek_nth(input, 1)
            .is_some_and(|next| is_word_start(next) || next == b':');
    if is_label {
        let end = cursor.offset();
        cursor.advance_byte(input);
        let span = Span::new(source_id, start, end, line);
        return Token::new(TokenKind::Label, word, span);
    }

    let span = Span::new(source_id, start, cursor.offset(), line);
    let kind = match Keyword::from_lexeme(word) {
        Some(keyword) => TokenKind::Keyword(keyword),
        None => TokenKind::Identifier,
    };
    Token::new(kind, word, span)
}

/// Scans `.name` when it spells a directive. Leaves the cursor untouched and
/// returns `None` otherwise, so `obj.method` still scans as `obj` `.` `method`.
pub(crate) fn scan_directive(
    cursor: &mut Cursor,
    input: &str,
    source_id: SourceId,
) -> Option<Token> {
    let mut probe = *cursor;
    let start = probe.offset();
    let line = probe.line();
    probe.advance_byte(input);
    probe.advance_while(input, is_word_continue);
    let lexeme = probe.slice_from(input, start);
    let directive = Directive::from_lexeme(lexeme)?;
    *cursor = probe;
    let span = Span::new(source_id, start, cursor.offset(), line);
    Some(Token::new(TokenKind::Directive(directive), directive.as_str(), span))
}

/// Scans a `:flag`.
pub(crate) fn scan_flag(
    cursor: &mut Cursor,
    input: &str,
    source_id: SourceId,
) -> Result<Token, LexError> {
    let start = cursor.offset();
    let line = cursor.line();
    cursor.advance_byte(input);
    cursor.advance_while(input, is_word_continue);
    let lexeme = cursor.slice_from(input, start);
    let span = Span::new(source_id, start, cursor.offset(), line);
    match FlagKind::from_lexeme(lexeme) {
        Some(flag) => Ok(Token::new(TokenKind::Flag(flag), lexeme, span)),
        None => Err(LexError::from_code(
            DiagnosticCode::UnknownFlag,
            format!("unknown flag '{lexeme}'"),
            span,
        )),
    }
}

/// Scans `$P0`, `$N1`, `$S2`, `$I3`.
pub(crate) fn scan_register(
    cursor: &mut Cursor,
    input: &str,
    source_id: SourceId,
) -> Result<Token, LexError> {
    let start = cursor.offset();
    let line = cursor.line();
    cursor.advance_byte(input);
    let class = cursor.peek_byte(input).and_then(RegisterClass::from_letter);
    cursor.advance_while(input, is_word_continue);
    let lexeme = cursor.slice_from(input, start);
    let span = Span::new(source_id, start, cursor.offset(), line);

    let number = lexeme
        .get(2..)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<u32>().ok());
    match (class, number) {
        (Some(class), Some(number)) => Ok(Token::new(TokenKind::Register(class), lexeme, span)
            .with_value(TokenValue::Register(number))),
        _ => Err(LexError::from_code(
            DiagnosticCode::MalformedRegister,
            format!("malformed register '{lexeme}'"),
            span,
        )),
    }
}

/// Scans an integer or floating-point literal, with an optional leading `-`.
pub(crate) fn scan_number(
    cursor: &mut Cursor,
    input: &str,
    source_id: SourceId,
) -> Result<Token, LexError> {
    let start = cursor.offset();
    let line = cursor.line();
    let negative = cursor.peek_byte(input) == Some(b'-');
    if negative {
        cursor.advance_byte(input);
    }

    let radix = match (cursor.peek_byte(input), cursor.peek_nth(input, 1)) {
        (Some(b'0'), Some(b'x' | b'X')) => 16,
        (Some(b'0'), Some(b'b' | b'B')) => 2,
        _ => 10,
    };
    if radix != 10 {
        cursor.advance_byte(input);
        cursor.advance_byte(input);
        let digits_start = cursor.offset();
        cursor.advance_while(input, is_word_continue);
        let digits = cursor.slice_from(input, digits_start);
        let lexeme = cursor.slice_from(input, start);
        let span = Span::new(source_id, start, cursor.offset(), line);
        return parse_radix(digits, radix, negative)
            .map(|value| {
                Token::new(TokenKind::IntConst, lexeme, span).with_value(TokenValue::Int(value))
            })
            .ok_or_else(|| malformed(lexeme, span));
    }

    cursor.advance_while(input, |byte| byte.is_ascii_digit());
    let mut is_num = false;
    if cursor.peek_byte(input) == Some(b'.')
        && cursor.peek_nth(input, 1).is_some_and(|b| b.is_ascii_digit())
    {
        is_num = true;
        cursor.advance_byte(input);
        cursor.advance_while(input, |byte| byte.is_ascii_digit());
    }
    if matches!(cursor.peek_byte(input), Some(b'e' | b'E')) {
        let exponent_digit = match cursor.peek_nth(input, 1) {
            Some(b'+' | b'-') => cursor.peek_nth(input, 2),
            other => other,
        };
        if exponent_digit.is_some_and(|b| b.is_ascii_digit()) {
            is_num = true;
            cursor.advance_byte(input);
            if matches!(cursor.peek_byte(input), Some(b'+' | b'-')) {
                cursor.advance_byte(input);
            }
            cursor.advance_while(input, |byte| byte.is_ascii_digit());
        }
    }

    let lexeme = cursor.slice_from(input, start);
    let span = Span::new(source_id, start, cursor.offset(), line);
    if is_num {
        lexeme
            .parse::<f64>()
            .map(|value| {
                Token::new(TokenKind::NumConst, lexeme, span).with_value(TokenValue::Num(value))
            })
            .map_err(|_| malformed(lexeme, span))
    } else {
        lexeme
            .parse::<i64>()
            .map(|value| {
                Token::new(TokenKind::IntConst, lexeme, span).with_value(TokenValue::Int(value))
            })
            .map_err(|_| malformed(lexeme, span))
    }
}

fn parse_radix(digits: &str, radix: u32, negative: bool) -> Option<i64> {
    if digits.is_empty() {
        return None;
    }
    // Hex and binary literals denote bit patterns, so `0xFFFFFFFFFFFFFFFF` is -1.
    let magnitude = u64::from_str_radix(digits, radix).ok()? as i64;
    Some(if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    })
}

fn malformed(lexeme: &str, span: Span) -> LexError {
    LexError::from_code(
        DiagnosticCode::MalformedNumber,
        format!("malformed number '{lexeme}'"),
        span,
    )
}

/// Returns `true` when the bytes at the cursor start a number literal.
pub(crate) fn starts_number(cursor: &Cursor, input: &str, allow_sign: bool) -> bool {
    match cursor.peek_byte(input) {
        Some(byte) if byte.is_ascii_digit() => true,
        Some(b'-') if allow_sign => cursor.peek_nth(input, 1).is_some_and(|b| b.is_ascii_digit()),
        _ => false,
    }
}
