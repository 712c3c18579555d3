//! Operator vocabularies and their opcode names.

use std::fmt;

use crate::lexer::OperatorKind;

/// Binary operator usable in `T = A op B`, `T op= B`, and constant folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    /// `//`
    FloorDiv,
    /// `.`
    Concat,
    BitOr,
    BitAnd,
    BitXor,
    /// `~~`, logical exclusive or.
    Xor,
    Shl,
    Shr,
    /// `>>>`, unsigned shift.
    Lsr,
    /// `||`
    Or,
    /// `&&`
    And,
    IsEq,
    IsLe,
    IsLt,
    IsGe,
    IsGt,
    IsNe,
}

impl BinaryOp {
    /// Returns the VM opcode name.
    pub const fn opcode(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::Pow => "pow",
            Self::FloorDiv => "fdiv",
            Self::Concat => "concat",
            Self::BitOr => "bor",
            Self::BitAnd => "band",
            Self::BitXor => "bxor",
            Self::Xor => "xor",
            Self::Shl => "shl",
            Self::Shr => "shr",
            Self::Lsr => "lsr",
            Self::Or => "or",
            Self::And => "and",
            Self::IsEq => "iseq",
            Self::IsLe => "isle",
            Self::IsLt => "islt",
            Self::IsGe => "isge",
            Self::IsGt => "isgt",
            Self::IsNe => "isne",
        }
    }

    /// Returns `true` for the `is*` comparison family.
    pub const fn is_relational(self) -> bool {
        matches!(
            self,
            Self::IsEq | Self::IsLe | Self::IsLt | Self::IsGe | Self::IsGt | Self::IsNe
        )
    }

    /// Maps an infix operator token (`+`, `**`, `==`, ...).
    pub const fn from_infix(operator: OperatorKind) -> Option<Self> {
        Some(match operator {
            OperatorKind::Plus => Self::Add,
            OperatorKind::Minus => Self::Sub,
            OperatorKind::Slash => Self::Div,
            OperatorKind::Star => Self::Mul,
            OperatorKind::Percent => Self::Mod,
            OperatorKind::Pipe => Self::BitOr,
            OperatorKind::Amp => Self::BitAnd,
            OperatorKind::Tilde => Self::BitXor,
            OperatorKind::StarStar => Self::Pow,
            OperatorKind::Dot => Self::Concat,
            OperatorKind::ShiftRightUnsigned => Self::Lsr,
            OperatorKind::ShiftRight => Self::Shr,
            OperatorKind::ShiftLeft => Self::Shl,
            OperatorKind::PipePipe => Self::Or,
            OperatorKind::AmpAmp => Self::And,
            OperatorKind::SlashSlash => Self::FloorDiv,
            OperatorKind::TildeTilde => Self::Xor,
            OperatorKind::EqualEqual => Self::IsEq,
            OperatorKind::LessEqual => Self::IsLe,
            OperatorKind::Less => Self::IsLt,
            OperatorKind::GreaterEqual => Self::IsGe,
            OperatorKind::Greater => Self::IsGt,
            OperatorKind::NotEqual => Self::IsNe,
            _ => return None,
        })
    }

    /// Maps an augmented assignment token (`+=`, `.=`, ...).
    pub const fn from_augmented(operator: OperatorKind) -> Option<Self> {
        Some(match operator {
            OperatorKind::PlusAssign => Self::Add,
            OperatorKind::MinusAssign => Self::Sub,
            OperatorKind::StarAssign => Self::Mul,
            OperatorKind::PercentAssign => Self::Mod,
            OperatorKind::StarStarAssign => Self::Pow,
            OperatorKind::SlashAssign => Self::Div,
            OperatorKind::SlashSlashAssign => Self::FloorDiv,
            OperatorKind::PipeAssign => Self::BitOr,
            OperatorKind::AmpAssign => Self::BitAnd,
            OperatorKind::TildeAssign => Self::BitXor,
            OperatorKind::DotAssign => Self::Concat,
            OperatorKind::ShiftRightAssign => Self::Shr,
            OperatorKind::ShiftLeftAssign => Self::Shl,
            OperatorKind::ShiftRightUnsignedAssign => Self::Lsr,
            _ => return None,
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode())
    }
}

/// Comparison used in conditional branches (`if a < b goto L`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    Ne,
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    /// Returns the branching opcode name.
    pub const fn opcode(self) -> &'static str {
        match self {
            Self::Ne => "ne",
            Self::Eq => "eq",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
        }
    }

    /// Returns the logical negation (`lt` becomes `ge`).
    pub const fn inverted(self) -> Self {
        match self {
            Self::Ne => Self::Eq,
            Self::Eq => Self::Ne,
            Self::Lt => Self::Ge,
            Self::Ge => Self::Lt,
            Self::Le => Self::Gt,
            Self::Gt => Self::Le,
        }
    }

    /// Maps a comparison token.
    pub const fn from_operator(operator: OperatorKind) -> Option<Self> {
        Some(match operator {
            OperatorKind::NotEqual => Self::Ne,
            OperatorKind::EqualEqual => Self::Eq,
            OperatorKind::Less => Self::Lt,
            OperatorKind::LessEqual => Self::Le,
            OperatorKind::Greater => Self::Gt,
            OperatorKind::GreaterEqual => Self::Ge,
            _ => return None,
        })
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode())
    }
}

/// Prefix operator in `T = op E`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `!`
    Not,
    /// `~`
    BitNot,
}

impl UnaryOp {
    /// Returns the VM opcode name.
    pub const fn opcode(self) -> &'static str {
        match self {
            Self::Neg => "neg",
            Self::Not => "not",
            Self::BitNot => "bnot",
        }
    }

    /// Maps a prefix token.
    pub const fn from_operator(operator: OperatorKind) -> Option<Self> {
        match operator {
            OperatorKind::Minus => Some(Self::Neg),
            OperatorKind::Bang => Some(Self::Not),
            OperatorKind::Tilde => Some(Self::BitNot),
            _ => None,
        }
    }
}
