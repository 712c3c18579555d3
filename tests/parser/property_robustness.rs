use pirc::ir::BuildOptions;
use pirc::{compile, CompileError};
use proptest::prelude::*;

const MAX_INPUT_BYTES: usize = 512;

const FRAGMENTS: &[&str] = &[
    ".sub main",
    ".sub 'f' :main :lex",
    ".end",
    ".local int i, j",
    ".local pmc p",
    ".param string s :optional",
    ".const int N = 4",
    ".lex \"$x\", p",
    "$I0 = 1 + 2",
    "$I0 = $I0 * 1",
    "i = j / 0",
    "$S0 = \"a\" . \"b\"",
    "$P0 = new 'Integer'",
    "p[1; \"k\"] = $I0",
    "if i < N goto L",
    "unless null p goto L",
    "L:",
    "L: noop",
    "goto M",
    "$P1 = foo(1, $P0 :flat)",
    "(i, j) = p.\"m\"()",
    ".begin_call",
    ".set_arg 1",
    ".call $P0",
    ".end_call",
    ".return (i)",
    "$I0 = = 1",
    "\"unterminated",
    "@",
];

fn fragment_lines() -> impl Strategy<Value = String> {
    proptest::collection::vec(proptest::sample::select(FRAGMENTS), 0..40)
        .prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn compiling_arbitrary_bytes_terminates_without_panicking(
        bytes in proptest::collection::vec(any::<u8>(), 0..=MAX_INPUT_BYTES)
    ) {
        let input = String::from_utf8_lossy(&bytes).into_owned();
        let options = BuildOptions::default();
        let limit = options.max_errors;
        match compile(&input, options) {
            Ok(output) => prop_assert!(output.diagnostics.len() <= limit),
            Err(CompileError::TooManyErrors { diagnostics }) => {
                prop_assert_eq!(diagnostics.len(), limit + 1);
            }
            Err(CompileError::Internal { .. }) => {}
        }
    }

    #[test]
    fn shuffled_statements_keep_labels_in_range(source in fragment_lines()) {
        let options = BuildOptions {
            max_errors: usize::MAX,
            ..BuildOptions::default()
        };
        if let Ok(output) = compile(&source, options) {
            for sub in &output.unit.subroutines {
                for (_, &index) in &sub.labels {
                    prop_assert!(index <= sub.statements.len());
                }
                for statement in &sub.statements {
                    if let Some(label) = statement.label() {
                        prop_assert!(sub.labels.contains_key(label));
                    }
                }
            }
        }
    }
}
