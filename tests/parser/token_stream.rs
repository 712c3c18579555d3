use pirc::lexer::{Lexer, OperatorKind, TokenKind};
use pirc::parser::{ParseErrorKind, TokenStream, MAX_LOOKAHEAD};

fn make_stream(input: &str) -> TokenStream<'_> {
    TokenStream::new(Lexer::new(input))
}

#[test]
fn peek_supports_bounded_lookahead() {
    let mut stream = make_stream("add $I0, 1\n");

    assert_eq!(stream.peek(0).expect("peek 0").unwrap().lexeme, "add");
    assert_eq!(stream.peek(1).expect("peek 1").unwrap().lexeme, "$I0");
    assert_eq!(stream.peek(2).expect("peek 2").unwrap().lexeme, ",");
    assert_eq!(stream.peek(3).expect("peek 3").unwrap().lexeme, "1");
}

#[test]
fn peek_rejects_lookahead_over_limit() {
    let mut stream = make_stream("noop\n");
    let error = stream
        .peek(MAX_LOOKAHEAD + 1)
        .expect_err("should reject lookahead");
    assert_eq!(error.kind, ParseErrorKind::LookaheadExceeded);
    assert_eq!(error.found.as_deref(), Some("lookahead 4"));
}

#[test]
fn peek_is_non_consuming_and_next_consumes() {
    let mut stream = make_stream("inc $I0\n");

    assert_eq!(stream.peek(0).expect("peek").unwrap().lexeme, "inc");
    let consumed = stream.next().expect("next").unwrap();
    assert_eq!(consumed.lexeme, "inc");
    assert_eq!(stream.peek(0).expect("peek").unwrap().lexeme, "$I0");
}

#[test]
fn peek_past_end_of_input_is_none() {
    let mut stream = make_stream("noop");
    assert!(stream.peek(2).expect("peek").is_none());
    assert!(stream.next().expect("next").is_some());
    assert!(stream.next().expect("next").is_none());
}

#[test]
fn expect_success_and_failure_are_deterministic() {
    let mut ok = make_stream("x\n");
    let token = ok
        .expect(|token| token.kind == TokenKind::Identifier, "identifier")
        .expect("expect should accept an identifier");
    assert_eq!(token.lexeme, "x");

    let mut fail = make_stream("(\n");
    let error = fail
        .expect(|token| token.kind == TokenKind::Identifier, "identifier")
        .expect_err("expect should reject '('");
    assert_eq!(error.kind, ParseErrorKind::UnexpectedToken);
    assert_eq!(error.expected, vec!["identifier".to_string()]);
    assert_eq!(error.found.as_deref(), Some("'('"));
    assert_eq!(
        error.to_string(),
        "syntax error, unexpected '(', expecting identifier"
    );
}

#[test]
fn consume_if_leaves_mismatches_in_place() {
    let mut stream = make_stream(", x");
    assert!(stream
        .consume_if(|token| token.is_operator(OperatorKind::Assign))
        .expect("consume_if")
        .is_none());
    assert!(stream
        .consume_if(|token| token.is_operator(OperatorKind::Comma))
        .expect("consume_if")
        .is_some());
}

#[test]
fn lexer_errors_surface_as_parse_errors() {
    let mut stream = make_stream("@");
    let error = stream.next().expect_err("should report the scanner error");
    assert_eq!(error.kind, ParseErrorKind::LexerError);
    assert_eq!(error.to_string(), "invalid character '@'");
    assert_eq!(error.line(), Some(1));
}

#[test]
fn skip_line_drops_buffered_and_unread_tokens() {
    let mut stream = make_stream("a b c d e\nnext\n");
    stream.peek(2).expect("peek");
    assert!(stream.skip_line());
    assert_eq!(stream.next().expect("next").unwrap().lexeme, "next");
}

#[test]
fn skip_line_ignores_scanner_errors() {
    let mut stream = make_stream("a @ ' b\nnext");
    assert!(stream.skip_line());
    assert_eq!(stream.next().expect("next").unwrap().lexeme, "next");
    assert!(!stream.skip_line());
}

#[test]
fn line_reports_the_next_token_line() {
    let mut stream = make_stream("\n\nnoop");
    assert_eq!(stream.line(), 1);
    stream.next().expect("next");
    stream.next().expect("next");
    assert_eq!(stream.line(), 3);
}
