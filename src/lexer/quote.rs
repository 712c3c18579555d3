//! Quoted string literal scanning.

use crate::lexer::cursor::Cursor;
use crate::lexer::diagnostics::{DiagnosticCode, LexError};
use crate::lexer::span::{ByteOffset, SourceId, Span};
use crate::lexer::token::{Token, TokenKind, TokenValue};

/// Scans a `"..."` or `'...'` literal starting at the opening quote.
///
/// Double-quoted strings process backslash escapes; single-quoted strings are
/// taken verbatim. A string may not cross a line boundary.
pub(crate) fn scan_string(
    cursor: &mut Cursor,
    input: &str,
    source_id: SourceId,
) -> Result<Token, LexError> {
    let start = cursor.offset();
    let line = cursor.line();
    let Some(quote) = cursor.advance_byte(input) else {
        return Err(unterminated(cursor, input, source_id, start, line));
    };
    let escapes = quote == b'"';
    let mut contents = String::new();

    loop {
        match cursor.peek_char(input) {
            None | Some('\n') => {
                return Err(unterminated(cursor, input, source_id, start, line));
            }
            Some(ch) if ch == char::from(quote) => {
                cursor.advance_byte(input);
                break;
            }
            Some('\\') if escapes => {
                cursor.advance_byte(input);
                match cursor.peek_char(input) {
                    None | Some('\n') => {
                        return Err(unterminated(cursor, input, source_id, start, line));
                    }
                    Some(escaped) => {
                        cursor.advance_char(input);
                        push_escape(&mut contents, escaped);
                    }
                }
            }
            Some(ch) => {
                cursor.advance_char(input);
                contents.push(ch);
            }
        }
    }

    let span = Span::new(source_id, start, cursor.offset(), line);
    let lexeme = cursor.slice_from(input, start);
    Ok(Token::new(TokenKind::StringConst, lexeme, span).with_value(TokenValue::Str(contents)))
}

fn push_escape(contents: &mut String, escaped: char) {
    match escaped {
        'n' => contents.push('\n'),
        't' => contents.push('\t'),
        'r' => contents.push('\r'),
        '0' => contents.push('\0'),
        'e' => contents.push('\u{1b}'),
        'a' => contents.push('\u{7}'),
        '\\' | '"' | '\'' => contents.push(escaped),
        other => {
            contents.push('\\');
            contents.push(other);
        }
    }
}

fn unterminated(
    cursor: &mut Cursor,
    input: &str,
    source_id: SourceId,
    start: ByteOffset,
    line: u32,
) -> LexError {
    // Skip the rest of the line so the next scan starts at the newline.
    cursor.advance_while(input, |byte| byte != b'\n');
    let span = Span::new(source_id, start, cursor.offset(), line);
    LexError::from_code(
        DiagnosticCode::UnterminatedString,
        "unterminated string constant",
        span,
    )
}
