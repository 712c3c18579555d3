use pirc::lexer::{LexStep, Lexer, TokenKind};
use proptest::prelude::*;

const MAX_INPUT_BYTES: usize = 256;

proptest! {
    #[test]
    fn scanning_arbitrary_input_terminates_without_panicking(
        bytes in proptest::collection::vec(any::<u8>(), 0..=MAX_INPUT_BYTES)
    ) {
        let input = String::from_utf8_lossy(&bytes).into_owned();
        let mut lexer = Lexer::new(&input);
        // Every step consumes at least one byte.
        for _ in 0..=input.len() {
            match lexer.next_token() {
                Ok(LexStep::EndOfInput) => return Ok(()),
                Ok(LexStep::Token(_)) | Err(_) => {}
            }
        }
        prop_assert_eq!(lexer.next_token(), Ok(LexStep::EndOfInput));
    }

    #[test]
    fn non_negative_integers_scan_to_their_value(value in 0i64..=i64::MAX) {
        let tokens = Lexer::new(&value.to_string()).tokenize().expect("should tokenize");
        prop_assert_eq!(tokens.len(), 1);
        prop_assert_eq!(tokens[0].kind, TokenKind::IntConst);
        prop_assert_eq!(tokens[0].int_value(), Some(value));
    }

    #[test]
    fn newline_count_matches_input(lines in proptest::collection::vec("[a-z ]{0,8}", 0..16)) {
        let input = lines.join("\n");
        let tokens = Lexer::new(&input).tokenize().expect("should tokenize");
        let newlines = tokens.iter().filter(|token| token.kind == TokenKind::Newline).count();
        prop_assert_eq!(newlines, lines.len().saturating_sub(1));
    }

    #[test]
    fn spans_are_ordered_and_within_input(
        words in proptest::collection::vec("[a-z]{1,6}|\\$I[0-9]{1,2}|[0-9]{1,4}|[-+*/=,]", 0..24)
    ) {
        let input = words.join(" ");
        let tokens = Lexer::new(&input).tokenize().expect("should tokenize");
        let mut previous_end = 0;
        for token in &tokens {
            prop_assert!(token.span.start.as_usize() >= previous_end);
            prop_assert!(token.span.end.as_usize() <= input.len());
            previous_end = token.span.end.as_usize();
        }
    }
}
