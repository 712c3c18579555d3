//! Operator scanning helpers for longest-match tokenization.

use crate::lexer::cursor::Cursor;
use crate::lexer::token::OperatorKind;

/// Result of scanning one operator token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OperatorScan {
    /// Operator category.
    pub(crate) kind: OperatorKind,
    /// Exact source lexeme.
    pub(crate) lexeme: &'static str,
}

// Longest spellings first; the scanner takes the first prefix match.
const OPERATORS: &[(&str, OperatorKind)] = &[
    (">>>=", OperatorKind::ShiftRightUnsignedAssign),
    (">>>", OperatorKind::ShiftRightUnsigned),
    (">>=", OperatorKind::ShiftRightAssign),
    ("<<=", OperatorKind::ShiftLeftAssign),
    ("//=", OperatorKind::SlashSlashAssign),
    ("**=", OperatorKind::StarStarAssign),
    ("=>", OperatorKind::FatArrow),
    ("==", OperatorKind::EqualEqual),
    ("!=", OperatorKind::NotEqual),
    ("<=", OperatorKind::LessEqual),
    (">=", OperatorKind::GreaterEqual),
    (">>", OperatorKind::ShiftRight),
    ("<<", OperatorKind::ShiftLeft),
    ("//", OperatorKind::SlashSlash),
    ("||", OperatorKind::PipePipe),
    ("&&", OperatorKind::AmpAmp),
    ("~~", OperatorKind::TildeTilde),
    ("**", OperatorKind::StarStar),
    ("+=", OperatorKind::PlusAssign),
    ("-=", OperatorKind::MinusAssign),
    ("*=", OperatorKind::StarAssign),
    ("%=", OperatorKind::PercentAssign),
    ("/=", OperatorKind::SlashAssign),
    ("|=", OperatorKind::PipeAssign),
    ("&=", OperatorKind::AmpAssign),
    ("~=", OperatorKind::TildeAssign),
    (".=", OperatorKind::DotAssign),
    ("=", OperatorKind::Assign),
    ("+", OperatorKind::Plus),
    ("-", OperatorKind::Minus),
    ("*", OperatorKind::Star),
    ("/", OperatorKind::Slash),
    ("%", OperatorKind::Percent),
    ("|", OperatorKind::Pipe),
    ("&", OperatorKind::Amp),
    ("~", OperatorKind::Tilde),
    ("!", OperatorKind::Bang),
    ("<", OperatorKind::Less),
    (">", OperatorKind::Greater),
    (".", OperatorKind::Dot),
    ("(", OperatorKind::LeftParen),
    (")", OperatorKind::RightParen),
    ("[", OperatorKind::LeftBracket),
    ("]", OperatorKind::RightBracket),
    (",", OperatorKind::Comma),
    (";", OperatorKind::Semicolon),
];

/// Scans an operator at cursor position using longest-match rules.
pub(crate) fn scan_operator(cursor: &mut Cursor, input: &str) -> Option<OperatorScan> {
    let tail = input.get(cursor.offset().as_usize()..)?;
    let (lexeme, kind) = OPERATORS
        .iter()
        .find(|(spelling, _)| tail.starts_with(spelling))?;
    for _ in 0..lexeme.len() {
        cursor.advance_byte(input);
    }
    Some(OperatorScan {
        kind: *kind,
        lexeme,
    })
}

impl OperatorKind {
    /// Returns the source spelling.
    pub fn as_str(self) -> &'static str {
        OPERATORS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("", |(spelling, _)| spelling)
    }

    /// Returns `true` for tokens after which a `-` begins a negative literal
    /// rather than a subtraction.
    pub(crate) fn expects_operand(self) -> bool {
        !matches!(self, Self::RightParen | Self::RightBracket)
    }
}
