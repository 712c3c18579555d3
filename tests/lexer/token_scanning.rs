use pirc::lexer::{
    Directive, FlagKind, Keyword, LexStep, Lexer, OperatorKind, RegisterClass, SourceId,
    TokenKind,
};

fn kinds(input: &str) -> Vec<TokenKind> {
    Lexer::new(input)
        .tokenize()
        .expect("should tokenize")
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

fn lexemes(input: &str) -> Vec<String> {
    Lexer::new(input)
        .tokenize()
        .expect("should tokenize")
        .into_iter()
        .map(|token| token.lexeme)
        .collect()
}

// ===========================================================================
// Structure
// ===========================================================================

#[test]
fn empty_input_reaches_end_of_input_immediately() {
    let mut lexer = Lexer::new("");
    assert_eq!(lexer.next_token().expect("should scan"), LexStep::EndOfInput);
}

#[test]
fn newlines_are_tokens_and_blanks_are_not() {
    assert_eq!(
        kinds("  \t\n\r\n"),
        vec![TokenKind::Newline, TokenKind::Newline]
    );
}

#[test]
fn comments_run_to_end_of_line() {
    assert_eq!(
        kinds("# header\nnoop # trailing\n"),
        vec![TokenKind::Newline, TokenKind::Identifier, TokenKind::Newline]
    );
}

#[test]
fn sub_header_scans_directive_name_and_flags() {
    assert_eq!(
        kinds(".sub main :main :load\n"),
        vec![
            TokenKind::Directive(Directive::Sub),
            TokenKind::Identifier,
            TokenKind::Flag(FlagKind::Main),
            TokenKind::Flag(FlagKind::Load),
            TokenKind::Newline,
        ]
    );
}

#[test]
fn every_call_block_directive_is_recognized() {
    let input = ".begin_call .set_arg .nci_call .invocant .meth_call .get_result .end_call";
    assert_eq!(
        kinds(input),
        vec![
            TokenKind::Directive(Directive::BeginCall),
            TokenKind::Directive(Directive::SetArg),
            TokenKind::Directive(Directive::NciCall),
            TokenKind::Directive(Directive::Invocant),
            TokenKind::Directive(Directive::MethCall),
            TokenKind::Directive(Directive::GetResult),
            TokenKind::Directive(Directive::EndCall),
        ]
    );
}

#[test]
fn directive_spelling_is_case_sensitive() {
    assert_eq!(
        kinds(".HLL .HLL_map"),
        vec![
            TokenKind::Directive(Directive::Hll),
            TokenKind::Directive(Directive::HllMap),
        ]
    );
}

#[test]
fn method_call_dot_is_not_a_directive() {
    assert_eq!(
        kinds("obj.length()"),
        vec![
            TokenKind::Identifier,
            TokenKind::Operator(OperatorKind::Dot),
            TokenKind::Identifier,
            TokenKind::Operator(OperatorKind::LeftParen),
            TokenKind::Operator(OperatorKind::RightParen),
        ]
    );
}

// ===========================================================================
// Words
// ===========================================================================

#[test]
fn keywords_are_classified() {
    assert_eq!(
        kinds("if unless null goto int num pmc string"),
        vec![
            TokenKind::Keyword(Keyword::If),
            TokenKind::Keyword(Keyword::Unless),
            TokenKind::Keyword(Keyword::Null),
            TokenKind::Keyword(Keyword::Goto),
            TokenKind::Keyword(Keyword::Int),
            TokenKind::Keyword(Keyword::Num),
            TokenKind::Keyword(Keyword::Pmc),
            TokenKind::Keyword(Keyword::String),
        ]
    );
}

#[test]
fn label_definition_drops_the_colon() {
    let tokens = Lexer::new("LOOP: inc i\n")
        .tokenize()
        .expect("should tokenize");
    assert_eq!(tokens[0].kind, TokenKind::Label);
    assert_eq!(tokens[0].lexeme, "LOOP");
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
}

#[test]
fn word_before_flag_is_not_a_label() {
    assert_eq!(
        kinds("x :flat"),
        vec![TokenKind::Identifier, TokenKind::Flag(FlagKind::Flat)]
    );
}

#[test]
fn registers_carry_class_and_number() {
    let tokens = Lexer::new("$P0 $N12 $S3 $I40")
        .tokenize()
        .expect("should tokenize");
    let scanned: Vec<_> = tokens
        .iter()
        .map(|token| (token.kind, token.register_number()))
        .collect();
    assert_eq!(
        scanned,
        vec![
            (TokenKind::Register(RegisterClass::Pmc), Some(0)),
            (TokenKind::Register(RegisterClass::Num), Some(12)),
            (TokenKind::Register(RegisterClass::String), Some(3)),
            (TokenKind::Register(RegisterClass::Int), Some(40)),
        ]
    );
}

// ===========================================================================
// Operators
// ===========================================================================

#[test]
fn longest_operator_wins() {
    assert_eq!(
        lexemes(">>>= >>> >> >= > ** **= // //= => == ="),
        vec![">>>=", ">>>", ">>", ">=", ">", "**", "**=", "//", "//=", "=>", "==", "="]
    );
}

#[test]
fn augmented_assignment_operators_are_single_tokens() {
    assert_eq!(
        kinds("+= -= .= ~~ ||"),
        vec![
            TokenKind::Operator(OperatorKind::PlusAssign),
            TokenKind::Operator(OperatorKind::MinusAssign),
            TokenKind::Operator(OperatorKind::DotAssign),
            TokenKind::Operator(OperatorKind::TildeTilde),
            TokenKind::Operator(OperatorKind::PipePipe),
        ]
    );
}

#[test]
fn minus_after_operand_is_an_operator() {
    assert_eq!(
        kinds("$I0 -1"),
        vec![
            TokenKind::Register(RegisterClass::Int),
            TokenKind::Operator(OperatorKind::Minus),
            TokenKind::IntConst,
        ]
    );
}

#[test]
fn minus_after_assignment_is_part_of_the_literal() {
    let tokens = Lexer::new("$I0 = -7").tokenize().expect("should tokenize");
    assert_eq!(tokens[2].kind, TokenKind::IntConst);
    assert_eq!(tokens[2].int_value(), Some(-7));
}

// ===========================================================================
// Spans
// ===========================================================================

#[test]
fn spans_track_lines_and_offsets() {
    let tokens = Lexer::with_source("noop\n  end\n", SourceId::new(4))
        .tokenize()
        .expect("should tokenize");
    let end = &tokens[2];
    assert_eq!(end.lexeme, "end");
    assert_eq!(end.line(), 2);
    assert_eq!(end.span.source_id, SourceId::new(4));
    assert_eq!(end.span.start.as_usize(), 7);
    assert_eq!(end.span.len(), 3);
}
