use pirc::ir::{BuildOptions, Builder, CompilationUnit, Diagnostic, DiagnosticKind, Fatal};
use pirc::lexer::Lexer;
use pirc::parser::{Parser, TokenStream};

fn parse_with(
    source: &str,
    options: BuildOptions,
) -> (Result<(), Fatal>, CompilationUnit, Vec<Diagnostic>) {
    let stream = TokenStream::new(Lexer::new(source));
    let mut parser = Parser::new(stream, Builder::new(options));
    let outcome = parser.parse_unit();
    let (unit, diagnostics) = parser.finish();
    (outcome, unit, diagnostics)
}

fn parse(source: &str) -> (CompilationUnit, Vec<Diagnostic>) {
    let (outcome, unit, diagnostics) = parse_with(source, BuildOptions::default());
    outcome.expect("should not abort");
    (unit, diagnostics)
}

fn rendered(unit: &CompilationUnit, sub: usize) -> Vec<String> {
    unit.subroutines[sub]
        .instructions()
        .map(ToString::to_string)
        .collect()
}

// ===========================================================================
// Line-level recovery
// ===========================================================================

#[test]
fn bad_statement_does_not_stop_following_lines() {
    let (unit, diagnostics) = parse(".sub main\n$I0 = = 1\n$I1 = 2\n.end\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Syntax);
    assert_eq!(
        diagnostics[0].message,
        "syntax error, unexpected '=', expecting expression"
    );
    assert_eq!(diagnostics[0].line, 2);
    assert_eq!(rendered(&unit, 0), vec!["set $I1, 2"]);
}

#[test]
fn each_bad_line_is_reported_once() {
    let (unit, diagnostics) = parse(".sub main\n$I0 = = 1\nnoop\n.local\n$I1 = (\n.end\n");
    let lines: Vec<u32> = diagnostics.iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![2, 4, 5]);
    assert_eq!(rendered(&unit, 0), vec!["noop"]);
}

#[test]
fn label_before_bad_statement_moves_to_next_statement() {
    let (unit, diagnostics) = parse(".sub main\nL: $I0 = = 1\nnoop\n.end\n");
    assert_eq!(diagnostics.len(), 1);
    let sub = &unit.subroutines[0];
    assert_eq!(sub.label_index("L"), Some(0));
    assert_eq!(sub.statements[0].label(), Some("L"));
}

#[test]
fn bad_top_level_line_is_skipped() {
    let (unit, diagnostics) = parse("garbage here\n.sub main\nnoop\n.end\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 1);
    assert_eq!(unit.subroutines.len(), 1);
    assert_eq!(rendered(&unit, 0), vec!["noop"]);
}

#[test]
fn bad_sub_header_still_parses_body() {
    let (unit, diagnostics) = parse(".sub main :outer\nnoop\n.end\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 1);
    assert_eq!(unit.subroutines[0].name, "main");
    assert_eq!(rendered(&unit, 0), vec!["noop"]);
}

// ===========================================================================
// Unbalanced subroutines
// ===========================================================================

#[test]
fn missing_end_is_reported_and_sub_kept() {
    let (unit, diagnostics) = parse(".sub main\n$I0 = 1\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message,
        "syntax error, unexpected end of file, expecting '.end'"
    );
    assert_eq!(unit.subroutines.len(), 1);
    assert_eq!(rendered(&unit, 0), vec!["set $I0, 1"]);
}

#[test]
fn nested_sub_closes_the_open_one() {
    let (unit, diagnostics) = parse(".sub a\nnoop\n.sub b\nnoop\n.end\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message,
        "syntax error, unexpected '.sub', expecting '.end'"
    );
    assert_eq!(diagnostics[0].line, 3);
    let names: Vec<&str> = unit.subroutines.iter().map(|sub| sub.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

// ===========================================================================
// Scanner errors
// ===========================================================================

#[test]
fn unterminated_string_is_a_syntax_diagnostic() {
    let (unit, diagnostics) = parse(".sub main\n$S0 = \"open\n$I1 = 2\n.end\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Syntax);
    assert_eq!(diagnostics[0].message, "unterminated string constant");
    assert_eq!(diagnostics[0].line, 2);
    assert_eq!(rendered(&unit, 0), vec!["set $I1, 2"]);
}

#[test]
fn invalid_character_skips_rest_of_line() {
    let (unit, diagnostics) = parse(".sub main\nnoop @ x\n$I0 = 1\n.end\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "invalid character '@'");
    assert_eq!(diagnostics[0].line, 2);
    assert_eq!(rendered(&unit, 0), vec!["set $I0, 1"]);
}

// ===========================================================================
// Error threshold
// ===========================================================================

#[test]
fn too_many_errors_aborts() {
    let options = BuildOptions {
        max_errors: 2,
        ..BuildOptions::default()
    };
    let source = ".sub main\n$I0 = = 1\n$I0 = = 2\n$I0 = = 3\n$I0 = = 4\n.end\n";
    let (outcome, _unit, diagnostics) = parse_with(source, options);
    assert_eq!(outcome, Err(Fatal::TooManyErrors { count: 3 }));
    assert_eq!(diagnostics.len(), 3);
}

#[test]
fn errors_at_the_threshold_do_not_abort() {
    let options = BuildOptions {
        max_errors: 2,
        ..BuildOptions::default()
    };
    let source = ".sub main\n$I0 = = 1\n$I0 = = 2\nnoop\n.end\n";
    let (outcome, unit, diagnostics) = parse_with(source, options);
    assert_eq!(outcome, Ok(()));
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(rendered(&unit, 0), vec!["noop"]);
}
