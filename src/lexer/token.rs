//! Token model for the PIR scanner.

use crate::lexer::span::Span;

/// Dot-directives recognized by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// `.HLL`
    Hll,
    /// `.HLL_map`
    HllMap,
    /// `.loadlib`
    Loadlib,
    /// `.sub`
    Sub,
    /// `.end`
    End,
    /// `.param`
    Param,
    /// `.lex`
    Lex,
    /// `.local`
    Local,
    /// `.namespace`
    Namespace,
    /// `.invocant`
    Invocant,
    /// `.meth_call`
    MethCall,
    /// `.globalconst`
    GlobalConst,
    /// `.const`
    Const,
    /// `.return`
    Return,
    /// `.yield`
    Yield,
    /// `.set_return`
    SetReturn,
    /// `.set_yield`
    SetYield,
    /// `.begin_return`
    BeginReturn,
    /// `.end_return`
    EndReturn,
    /// `.begin_yield`
    BeginYield,
    /// `.end_yield`
    EndYield,
    /// `.begin_call`
    BeginCall,
    /// `.end_call`
    EndCall,
    /// `.get_results`
    GetResults,
    /// `.call`
    Call,
    /// `.set_arg`
    SetArg,
    /// `.get_result`
    GetResult,
    /// `.nci_call`
    NciCall,
    /// `.tailcall`
    Tailcall,
}

const DIRECTIVES: &[(Directive, &str)] = &[
    (Directive::Hll, ".HLL"),
    (Directive::HllMap, ".HLL_map"),
    (Directive::Loadlib, ".loadlib"),
    (Directive::Sub, ".sub"),
    (Directive::End, ".end"),
    (Directive::Param, ".param"),
    (Directive::Lex, ".lex"),
    (Directive::Local, ".local"),
    (Directive::Namespace, ".namespace"),
    (Directive::Invocant, ".invocant"),
    (Directive::MethCall, ".meth_call"),
    (Directive::GlobalConst, ".globalconst"),
    (Directive::Const, ".const"),
    (Directive::Return, ".return"),
    (Directive::Yield, ".yield"),
    (Directive::SetReturn, ".set_return"),
    (Directive::SetYield, ".set_yield"),
    (Directive::BeginReturn, ".begin_return"),
    (Directive::EndReturn, ".end_return"),
    (Directive::BeginYield, ".begin_yield"),
    (Directive::EndYield, ".end_yield"),
    (Directive::BeginCall, ".begin_call"),
    (Directive::EndCall, ".end_call"),
    (Directive::GetResults, ".get_results"),
    (Directive::Call, ".call"),
    (Directive::SetArg, ".set_arg"),
    (Directive::GetResult, ".get_result"),
    (Directive::NciCall, ".nci_call"),
    (Directive::Tailcall, ".tailcall"),
];

impl Directive {
    /// Looks up a directive by its spelling, including the leading dot.
    pub fn from_lexeme(lexeme: &str) -> Option<Self> {
        DIRECTIVES
            .iter()
            .find(|(_, text)| *text == lexeme)
            .map(|(directive, _)| *directive)
    }

    /// Returns the source spelling.
    pub fn as_str(self) -> &'static str {
        DIRECTIVES
            .iter()
            .find(|(directive, _)| *directive == self)
            .map_or("", |(_, text)| text)
    }
}

/// Colon-prefixed flags (`:main`, `:slurpy`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    Init,
    Load,
    Main,
    Anon,
    Method,
    Outer,
    Vtable,
    Lex,
    Multi,
    Postcomp,
    Immediate,
    Lexid,
    Instanceof,
    UniqueReg,
    Named,
    Slurpy,
    Flat,
    Optional,
    OptFlag,
    Invocant,
}

const FLAGS: &[(FlagKind, &str)] = &[
    (FlagKind::Init, ":init"),
    (FlagKind::Load, ":load"),
    (FlagKind::Main, ":main"),
    (FlagKind::Anon, ":anon"),
    (FlagKind::Method, ":method"),
    (FlagKind::Outer, ":outer"),
    (FlagKind::Vtable, ":vtable"),
    (FlagKind::Lex, ":lex"),
    (FlagKind::Multi, ":multi"),
    (FlagKind::Postcomp, ":postcomp"),
    (FlagKind::Immediate, ":immediate"),
    (FlagKind::Lexid, ":lexid"),
    (FlagKind::Instanceof, ":instanceof"),
    (FlagKind::UniqueReg, ":unique_reg"),
    (FlagKind::Named, ":named"),
    (FlagKind::Slurpy, ":slurpy"),
    (FlagKind::Flat, ":flat"),
    (FlagKind::Optional, ":optional"),
    (FlagKind::OptFlag, ":opt_flag"),
    (FlagKind::Invocant, ":invocant"),
];

impl FlagKind {
    /// Looks up a flag by its spelling, including the leading colon.
    pub fn from_lexeme(lexeme: &str) -> Option<Self> {
        FLAGS
            .iter()
            .find(|(_, text)| *text == lexeme)
            .map(|(flag, _)| *flag)
    }

    /// Returns the source spelling.
    pub fn as_str(self) -> &'static str {
        FLAGS
            .iter()
            .find(|(flag, _)| *flag == self)
            .map_or("", |(_, text)| text)
    }
}

/// Reserved words. They may still be used as identifiers where the grammar
/// allows it (`.local int null`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    If,
    Unless,
    Null,
    Goto,
    Int,
    Num,
    Pmc,
    String,
}

impl Keyword {
    /// Classifies an identifier lexeme.
    pub fn from_lexeme(lexeme: &str) -> Option<Self> {
        match lexeme {
            "if" => Some(Self::If),
            "unless" => Some(Self::Unless),
            "null" => Some(Self::Null),
            "goto" => Some(Self::Goto),
            "int" => Some(Self::Int),
            "num" => Some(Self::Num),
            "pmc" => Some(Self::Pmc),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    /// Returns the source spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Unless => "unless",
            Self::Null => "null",
            Self::Goto => "goto",
            Self::Int => "int",
            Self::Num => "num",
            Self::Pmc => "pmc",
            Self::String => "string",
        }
    }
}

/// Register class letter in `$P0`, `$N1`, `$S2`, `$I3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterClass {
    Pmc,
    Num,
    String,
    Int,
}

impl RegisterClass {
    /// Classifies the letter following `$`.
    pub const fn from_letter(letter: u8) -> Option<Self> {
        match letter {
            b'P' => Some(Self::Pmc),
            b'N' => Some(Self::Num),
            b'S' => Some(Self::String),
            b'I' => Some(Self::Int),
            _ => None,
        }
    }

    /// Returns the class letter.
    pub const fn letter(self) -> char {
        match self {
            Self::Pmc => 'P',
            Self::Num => 'N',
            Self::String => 'S',
            Self::Int => 'I',
        }
    }
}

/// Operator and punctuation tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    /// `=`
    Assign,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `|`
    Pipe,
    /// `&`
    Amp,
    /// `~`
    Tilde,
    /// `!`
    Bang,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `.`
    Dot,
    /// `**`
    StarStar,
    /// `>>>`
    ShiftRightUnsigned,
    /// `>>`
    ShiftRight,
    /// `<<`
    ShiftLeft,
    /// `//`
    SlashSlash,
    /// `||`
    PipePipe,
    /// `&&`
    AmpAmp,
    /// `~~`
    TildeTilde,
    /// `==`
    EqualEqual,
    /// `!=`
    NotEqual,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `=>`
    FatArrow,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `*=`
    StarAssign,
    /// `%=`
    PercentAssign,
    /// `**=`
    StarStarAssign,
    /// `/=`
    SlashAssign,
    /// `//=`
    SlashSlashAssign,
    /// `|=`
    PipeAssign,
    /// `&=`
    AmpAssign,
    /// `~=`
    TildeAssign,
    /// `.=`
    DotAssign,
    /// `>>=`
    ShiftRightAssign,
    /// `<<=`
    ShiftLeftAssign,
    /// `>>>=`
    ShiftRightUnsignedAssign,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
}

/// Token category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Statement terminator.
    Newline,
    /// `.sub`, `.local`, ...
    Directive(Directive),
    /// `:main`, `:slurpy`, ...
    Flag(FlagKind),
    /// `if`, `goto`, `int`, ...
    Keyword(Keyword),
    /// Plain identifier.
    Identifier,
    /// `name:` at the start of an instruction. The lexeme omits the colon.
    Label,
    /// `$P0`-style register.
    Register(RegisterClass),
    /// Integer literal.
    IntConst,
    /// Floating-point literal.
    NumConst,
    /// Quoted string literal.
    StringConst,
    /// Operator or punctuation.
    Operator(OperatorKind),
}

/// Literal payload decoded while scanning.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    /// No payload.
    None,
    /// Value of an [`TokenKind::IntConst`].
    Int(i64),
    /// Value of a [`TokenKind::NumConst`].
    Num(f64),
    /// Escape-processed contents of a [`TokenKind::StringConst`].
    Str(String),
    /// Number of a [`TokenKind::Register`].
    Register(u32),
}

/// A lexical token with raw text and source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token category.
    pub kind: TokenKind,
    /// Token text preserved as scanned (labels drop their colon).
    pub lexeme: String,
    /// Decoded literal value.
    pub value: TokenValue,
    /// Byte-oriented source span.
    pub span: Span,
}

impl Token {
    /// Creates a token without a literal payload.
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            value: TokenValue::None,
            span,
        }
    }

    /// Attaches a literal payload.
    pub fn with_value(mut self, value: TokenValue) -> Self {
        self.value = value;
        self
    }

    /// Returns the source line of the token.
    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn int_value(&self) -> Option<i64> {
        match self.value {
            TokenValue::Int(value) => Some(value),
            _ => None,
        }
    }

    pub fn num_value(&self) -> Option<f64> {
        match self.value {
            TokenValue::Num(value) => Some(value),
            _ => None,
        }
    }

    pub fn string_value(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn register_number(&self) -> Option<u32> {
        match self.value {
            TokenValue::Register(number) => Some(number),
            _ => None,
        }
    }

    /// Returns `true` for the given operator.
    pub fn is_operator(&self, operator: OperatorKind) -> bool {
        self.kind == TokenKind::Operator(operator)
    }

    /// Returns `true` for the given keyword.
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    /// Returns `true` for the given directive.
    pub fn is_directive(&self, directive: Directive) -> bool {
        self.kind == TokenKind::Directive(directive)
    }

    /// Returns `true` for a newline token.
    pub fn is_newline(&self) -> bool {
        self.kind == TokenKind::Newline
    }

    /// Returns `true` when the token can name a symbol: identifiers and
    /// keywords both qualify.
    pub fn is_name(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier | TokenKind::Keyword(_))
    }

    /// Text used for this token in syntax error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Newline => "newline".to_string(),
            TokenKind::Label => format!("'{}:'", self.lexeme),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

/// One step produced by [`crate::lexer::Lexer::next_token`].
#[derive(Debug, Clone, PartialEq)]
pub enum LexStep {
    /// A concrete token was produced.
    Token(Token),
    /// End of input was reached.
    EndOfInput,
}
