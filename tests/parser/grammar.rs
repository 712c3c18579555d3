use pirc::ir::{
    BuildOptions, Builder, CompilationUnit, ConstValue, Diagnostic, DiagnosticKind, SubFlags,
    Subroutine, TargetFlags, ValueType,
};
use pirc::lexer::Lexer;
use pirc::parser::{Parser, TokenStream};

// ===========================================================================
// Helpers
// ===========================================================================

fn build(source: &str) -> (CompilationUnit, Vec<Diagnostic>) {
    let stream = TokenStream::new(Lexer::new(source));
    let mut parser = Parser::new(stream, Builder::new(BuildOptions::default()));
    parser.parse_unit().expect("should not abort");
    parser.finish()
}

/// Builds `body` inside `.sub main` and returns the rendered instructions.
fn body(body: &str) -> Vec<String> {
    let source = format!(".sub main\n{body}\n.end\n");
    let (unit, diagnostics) = build(&source);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    render(&unit.subroutines[0])
}

fn render(sub: &Subroutine) -> Vec<String> {
    sub.instructions().map(ToString::to_string).collect()
}

// ===========================================================================
// Assignments
// ===========================================================================

#[test]
fn literal_assignments() {
    assert_eq!(
        body("$I0 = 42\n$N0 = 2.5\n$S0 = \"hi\"\n$I1 = 0\n$N1 = 0.0"),
        vec![
            "set $I0, 42",
            "set $N0, 2.5",
            "set $S0, \"hi\"",
            "null $I1",
            "null $N1",
        ]
    );
}

#[test]
fn constant_operands_fold() {
    assert_eq!(
        body(".local int x\nx = 3 + 4\n$N0 = 1.5 * 2\n$S0 = \"a\" . \"b\"\n$I0 = 7 < 9"),
        vec!["set x, 7", "set $N0, 3.0", "set $S0, \"ab\"", "set $I0, 1"]
    );
}

#[test]
fn self_referencing_arithmetic_is_reduced() {
    assert_eq!(
        body("$I0 = $I0 + 1\n$I1 = $I1 * 0\n$I2 = $I2 - 0\n$N0 = $N0 / 1"),
        vec!["inc $I0", "null $I1", "noop", "noop"]
    );
}

#[test]
fn three_operand_arithmetic_is_kept() {
    assert_eq!(
        body("$I0 = $I1 + $I2\n$I0 = $I1 - 1"),
        vec!["add $I0, $I1, $I2", "sub $I0, $I1, 1"]
    );
}

#[test]
fn augmented_assignment() {
    assert_eq!(
        body("$I0 += 5\n$I0 -= 1\n$S0 .= \"x\"\n$N0 *= 1"),
        vec!["add $I0, 5", "dec $I0", "concat $S0, \"x\"", "noop"]
    );
}

#[test]
fn unary_assignment() {
    assert_eq!(
        body("$I0 = -$I1\n$I0 = !$I1\n$I0 = ~$I1"),
        vec!["neg $I0, $I1", "not $I0, $I1", "bnot $I0, $I1"]
    );
}

#[test]
fn opcode_assignment_prepends_the_target() {
    assert_eq!(
        body("$P0 = new 'Integer'\n$S0 = concat $S1, \"x\""),
        vec!["new $P0, \"Integer\"", "concat $S0, $S1, \"x\""]
    );
}

#[test]
fn bare_name_assignment_prefers_symbols_then_constants_then_opcodes() {
    assert_eq!(
        body(".local int x\n.const int SIZE = 10\n$I0 = x\n$I1 = SIZE\n$P0 = null"),
        vec!["set $I0, x", "set $I1, 10", "null $P0"]
    );
}

#[test]
fn named_constants_fold_in_expressions() {
    assert_eq!(
        body(".const int SIZE = 10\n$I0 = SIZE * 2"),
        vec!["set $I0, 20"]
    );
}

#[test]
fn keyed_reads_and_stores() {
    assert_eq!(
        body(".local pmc hash\n$P1 = $P0[1]\n$P0[\"k\"] = 5\nhash[\"a\"; 2] = $P1\n$P2 = hash[$S0]"),
        vec![
            "set $P1, $P0[1]",
            "set $P0[\"k\"], 5",
            "set hash[\"a\";2], $P1",
            "set $P2, hash[$S0]",
        ]
    );
}

#[test]
fn undeclared_indexed_object_is_reported() {
    let (unit, diagnostics) = build(".sub main\nx[1] = 2\n$I0 = x[1]\n.end\n");
    let reported: Vec<(DiagnosticKind, u32, &str)> = diagnostics
        .iter()
        .map(|d| (d.kind, d.line, d.message.as_str()))
        .collect();
    assert_eq!(
        reported,
        vec![
            (DiagnosticKind::UndeclaredSymbol, 2, "indexed object 'x' not declared"),
            (DiagnosticKind::UndeclaredSymbol, 3, "indexed object 'x' not declared"),
        ]
    );
    assert_eq!(render(&unit.subroutines[0]), vec!["set x[1], 2", "set $I0, x[1]"]);
}

#[test]
fn non_pmc_indexed_object_is_a_type_mismatch() {
    let (unit, diagnostics) = build(".sub main\n.local int x\nx[1] = 2\n$I0 = x[1]\n.end\n");
    let reported: Vec<(DiagnosticKind, u32, &str)> = diagnostics
        .iter()
        .map(|d| (d.kind, d.line, d.message.as_str()))
        .collect();
    assert_eq!(
        reported,
        vec![
            (DiagnosticKind::TypeMismatch, 3, "indexed object 'x' is not of type 'pmc'"),
            (DiagnosticKind::TypeMismatch, 4, "indexed object 'x' is not of type 'pmc'"),
        ]
    );
    assert_eq!(render(&unit.subroutines[0]), vec!["set x[1], 2", "set $I0, x[1]"]);
}

#[test]
fn keyed_opcode_assignment_passes_the_key() {
    assert_eq!(
        body("$I0 = exists $P0[\"k\"]"),
        vec!["exists $I0, $P0[\"k\"]"]
    );
}

// ===========================================================================
// Instructions and labels
// ===========================================================================

#[test]
fn plain_opcodes_keep_their_operands() {
    assert_eq!(
        body("print \"hello\"\nnew $P0, 'Integer'\nnoop"),
        vec!["print \"hello\"", "new $P0, \"Integer\"", "noop"]
    );
}

#[test]
fn labels_attach_to_the_next_statement() {
    let (unit, diagnostics) = build(".sub main\nSTART:\n  noop\nLOOP: inc $I0\n  lt $I0, 5, LOOP\n.end\n");
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    let sub = &unit.subroutines[0];
    assert_eq!(
        render(sub),
        vec!["START: noop", "LOOP: inc $I0", "lt $I0, 5, LOOP"]
    );
    assert_eq!(sub.label_index("START"), Some(0));
    assert_eq!(sub.label_index("LOOP"), Some(1));
}

#[test]
fn trailing_label_points_past_the_last_statement() {
    let (unit, diagnostics) = build(".sub main\n  goto DONE\nDONE:\n.end\n");
    assert!(diagnostics.is_empty());
    let sub = &unit.subroutines[0];
    assert_eq!(render(sub), vec!["branch DONE"]);
    assert_eq!(sub.label_index("DONE"), Some(1));
}

#[test]
fn duplicate_label_is_reported() {
    let (_, diagnostics) = build(".sub main\nL: noop\nL: noop\n.end\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::DuplicateLabel);
    assert_eq!(diagnostics[0].line, 3);
}

#[test]
fn unknown_opcode_is_reported_and_kept() {
    let (unit, diagnostics) = build(".sub main\nfrobnicate $I0\n.end\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UnknownOpcode);
    assert_eq!(
        diagnostics[0].message,
        "'frobnicate' is not a parrot instruction"
    );
    assert_eq!(render(&unit.subroutines[0]), vec!["frobnicate $I0"]);
}

// ===========================================================================
// Conditionals
// ===========================================================================

#[test]
fn variable_conditionals() {
    assert_eq!(
        body(".local int x\nif $I0 goto L\nunless x goto L\nif null $P0 goto L\nunless null x goto L\nL:"),
        vec![
            "if $I0, L",
            "unless x, L",
            "if_null $P0, L",
            "unless_null x, L",
        ]
    );
}

#[test]
fn relational_conditionals_invert_for_unless() {
    assert_eq!(
        body("if $I0 < 10 goto L\nunless $I0 < 10 goto L\nunless $S0 == \"a\" goto L\nL:"),
        vec!["lt $I0, 10, L", "ge $I0, 10, L", "ne $S0, \"a\", L"]
    );
}

#[test]
fn constant_conditionals_resolve_now() {
    assert_eq!(
        body("if 1 goto L\nif 0 goto L\nunless \"\" goto L\nif 3 > 2 goto L\nunless 2.5 goto L\nL:"),
        vec!["branch L", "noop", "branch L", "branch L", "noop"]
    );
}

#[test]
fn named_constant_conditions_resolve_now() {
    assert_eq!(
        body(
            ".const int DEBUG = 1\n.const string EMPTY = \"\"\n\
             if DEBUG goto L\nif EMPTY goto L\nunless DEBUG goto L\nL:"
        ),
        vec!["branch L", "noop", "noop"]
    );
}

#[test]
fn local_shadows_constant_in_conditions() {
    assert_eq!(
        body(".const int FLAG = 1\n.local int FLAG\nif FLAG goto L\nL:"),
        vec!["if FLAG, L"]
    );
}

#[test]
fn comma_may_replace_goto() {
    assert_eq!(body("if $I0, L\nL:"), vec!["if $I0, L"]);
}

#[test]
fn variable_named_null_is_a_plain_condition() {
    assert_eq!(
        body(".local int null\nif null goto L\nL:"),
        vec!["if null, L"]
    );
}

// ===========================================================================
// Declarations
// ===========================================================================

#[test]
fn locals_allocate_typed_symbols() {
    let (unit, diagnostics) = build(".sub main\n.local int a, b :unique_reg\n.local pmc p\n.end\n");
    assert!(diagnostics.is_empty());
    let symbols = &unit.subroutines[0].symbols;
    assert_eq!(symbols.len(), 3);
    let b = symbols.lookup("b").expect("should declare b");
    assert_eq!(b.ty, ValueType::Int);
    assert!(b.unique_reg);
    assert_eq!(
        symbols.lookup("p").expect("should declare p").ty,
        ValueType::Pmc
    );
}

#[test]
fn duplicate_local_is_reported() {
    let (_, diagnostics) = build(".sub main\n.local int a\n.local num a\n.end\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::DuplicateSymbol);
    assert_eq!(diagnostics[0].message, "symbol 'a' is already declared");
}

#[test]
fn undeclared_identifier_is_reported() {
    let (_, diagnostics) = build(".sub main\nx = 1\n.end\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UndeclaredSymbol);
    assert_eq!(diagnostics[0].message, "symbol 'x' not declared");
    assert_eq!(diagnostics[0].line, 2);
}

#[test]
fn lexicals_bind_pmc_targets() {
    let (unit, diagnostics) = build(".sub main :lex\n.local pmc p\n.lex \"$x\", p\n.lex \"$y\", $P1\n.end\n");
    assert!(diagnostics.is_empty());
    let lexicals = &unit.subroutines[0].lexicals;
    assert_eq!(lexicals.len(), 2);
    assert_eq!(lexicals[0].name, "$x");
    assert_eq!(lexicals[0].target.lex_name.as_deref(), Some("$x"));
    assert_eq!(lexicals[1].target.to_string(), "$P1");
}

#[test]
fn lexical_of_wrong_type_is_reported() {
    let (_, diagnostics) = build(".sub main\n.local int i\n.lex \"i\", i\n.end\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::TypeMismatch);
    assert_eq!(diagnostics[0].message, "lexical 'i' must be of type 'pmc'");
}

#[test]
fn parameters_carry_flags() {
    let source = ".sub f\n.param int a :optional\n.param int has_a :opt_flag\n.param pmc rest :slurpy\n.param string n :named(\"nm\")\n.param pmc self :invocant(\"Foo\")\n.end\n";
    let (unit, diagnostics) = build(source);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    let params = &unit.subroutines[0].parameters;
    assert_eq!(params.len(), 5);
    assert!(params[0].target.flags.contains(TargetFlags::OPTIONAL));
    assert!(params[1].target.flags.contains(TargetFlags::OPT_FLAG));
    assert!(params[2].target.flags.contains(TargetFlags::SLURPY));
    assert!(params[3].target.flags.contains(TargetFlags::NAMED));
    assert_eq!(params[3].target.alias.as_deref(), Some("nm"));
    assert!(params[4].target.flags.contains(TargetFlags::INVOCANT));
    assert_eq!(params[4].invocant_type.as_deref(), Some("Foo"));
}

// ===========================================================================
// Subroutines and top-level directives
// ===========================================================================

#[test]
fn sub_flags_are_recorded() {
    let (unit, diagnostics) = build(
        ".sub outer\n.end\n.sub 'inner' :main :anon :vtable :outer(outer) :lexid(\"L1\") :instanceof(\"Sub\")\n.end\n",
    );
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    let inner = unit.find_subroutine("inner").expect("should build inner");
    assert!(inner.flags.contains(SubFlags::MAIN));
    assert!(inner.flags.contains(SubFlags::ANON));
    assert_eq!(inner.vtable.as_deref(), Some("inner"));
    assert_eq!(inner.outer.as_deref(), Some("outer"));
    assert_eq!(inner.lexid.as_deref(), Some("L1"));
    assert_eq!(inner.instanceof.as_deref(), Some("Sub"));
}

#[test]
fn named_vtable_overrides_the_sub_name() {
    let (unit, _) = build(".sub get_num :vtable(\"get_number\")\n.end\n");
    assert_eq!(unit.subroutines[0].vtable.as_deref(), Some("get_number"));
}

#[test]
fn top_level_directives_fill_the_unit() {
    let source = ".HLL \"perl6\"\n.HLL_map \"Integer\" = \"MyInt\"\n.loadlib \"io_ops\"\n.globalconst int G = 1\n.const string S = \"s\"\n.namespace [\"A\"; \"B\"]\n.sub f\n.end\n";
    let (unit, diagnostics) = build(source);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    assert_eq!(unit.hll.as_deref(), Some("perl6"));
    assert_eq!(unit.hll_map.get("Integer").map(String::as_str), Some("MyInt"));
    assert_eq!(unit.libraries, vec!["io_ops".to_string()]);
    assert_eq!(
        unit.global_constants.get("G").map(|constant| &constant.value),
        Some(&ConstValue::Int(1))
    );
    assert!(unit.constants.contains_key("S"));
    let namespace = unit.subroutines[0]
        .namespace
        .as_ref()
        .expect("should record the namespace");
    assert_eq!(namespace.to_string(), "[\"A\";\"B\"]");
}

#[test]
fn global_constants_resolve_inside_subs() {
    assert_eq!(
        body(".globalconst num PI = 3.5\n$N0 = PI"),
        vec!["set $N0, 3.5"]
    );
}

#[test]
fn several_subs_are_kept_in_order() {
    let (unit, diagnostics) = build(".sub a\n.end\n\n.sub b\nnoop\n.end\n");
    assert!(diagnostics.is_empty());
    let names: Vec<_> = unit.subroutines.iter().map(|sub| sub.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}
