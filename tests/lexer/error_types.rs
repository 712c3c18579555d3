use pirc::lexer::{DiagnosticCode, LexError, LexStep, Lexer, TokenKind};

fn first_error(input: &str) -> LexError {
    Lexer::new(input)
        .tokenize()
        .expect_err("should fail to tokenize")
}

// ===========================================================================
// Codes and messages
// ===========================================================================

#[test]
fn unterminated_string_at_newline() {
    let error = first_error("\"abc\nnoop");
    assert_eq!(error.diagnostic().code, DiagnosticCode::UnterminatedString);
    assert_eq!(error.to_string(), "unterminated string constant");
    assert_eq!(error.line(), 1);
}

#[test]
fn unterminated_string_at_end_of_input() {
    let error = first_error("'abc");
    assert_eq!(error.diagnostic().code, DiagnosticCode::UnterminatedString);
}

#[test]
fn invalid_character() {
    let error = first_error("noop @");
    assert_eq!(error.diagnostic().code, DiagnosticCode::InvalidCharacter);
    assert_eq!(error.to_string(), "invalid character '@'");
}

#[test]
fn malformed_register() {
    let error = first_error("$X1");
    assert_eq!(error.diagnostic().code, DiagnosticCode::MalformedRegister);
    assert_eq!(error.to_string(), "malformed register '$X1'");

    let error = first_error("$P");
    assert_eq!(error.diagnostic().code, DiagnosticCode::MalformedRegister);
}

#[test]
fn malformed_numbers() {
    assert_eq!(
        first_error("0x").diagnostic().code,
        DiagnosticCode::MalformedNumber
    );
    assert_eq!(
        first_error("99999999999999999999").diagnostic().code,
        DiagnosticCode::MalformedNumber
    );
}

#[test]
fn unknown_flag() {
    let error = first_error(".sub f :bogus");
    assert_eq!(error.diagnostic().code, DiagnosticCode::UnknownFlag);
    assert_eq!(error.to_string(), "unknown flag ':bogus'");
}

// ===========================================================================
// Continuing after an error
// ===========================================================================

#[test]
fn scanning_resumes_after_invalid_character() {
    let mut lexer = Lexer::new("@ noop");
    assert!(lexer.next_token().is_err());
    match lexer.next_token().expect("should scan") {
        LexStep::Token(token) => {
            assert_eq!(token.kind, TokenKind::Identifier);
            assert_eq!(token.lexeme, "noop");
        }
        LexStep::EndOfInput => panic!("expected a token"),
    }
}

#[test]
fn error_spans_point_at_the_offending_text() {
    let error = first_error("noop\n  @");
    let span = error.diagnostic().span;
    assert_eq!(span.line, 2);
    assert_eq!(span.start.as_usize(), 7);
}
