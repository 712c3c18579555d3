//! IR node model: targets, keys, expressions, arguments, invocations, and
//! instructions.
//!
//! Nodes form owned trees. A statement owns its operands; a key owns its
//! entries. Nothing is shared.

use std::fmt;

use smallvec::SmallVec;

use crate::ir::constant::Constant;
use crate::ir::flags::{ArgFlags, TargetFlags};
use crate::ir::ids::RegisterId;
use crate::ir::symbol::Symbol;
use crate::ir::types::ValueType;

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Storage a target refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetBase {
    /// Explicit register such as `$P0`.
    Register { ty: ValueType, number: u32 },
    /// Named symbol. `register` is `None` for placeholders and global names.
    Symbol {
        name: String,
        ty: ValueType,
        register: Option<RegisterId>,
    },
}

/// Assignable location: a register or symbol, optionally indexed by a key.
///
/// Equality compares storage and key only. Flags, aliases, and lexical names
/// are annotations and do not make two targets distinct.
#[derive(Debug, Clone)]
pub struct Target {
    pub base: TargetBase,
    pub key: Option<Key>,
    pub flags: TargetFlags,
    /// Name given by `:named("alias")`.
    pub alias: Option<String>,
    /// Lexical name bound by `.lex`.
    pub lex_name: Option<String>,
}

impl Target {
    fn from_base(base: TargetBase) -> Self {
        Self {
            base,
            key: None,
            flags: TargetFlags::empty(),
            alias: None,
            lex_name: None,
        }
    }

    /// Creates a register target.
    pub fn register(ty: ValueType, number: u32) -> Self {
        Self::from_base(TargetBase::Register { ty, number })
    }

    /// Creates a target bound to a symbol.
    pub fn from_symbol(symbol: &Symbol) -> Self {
        Self::from_base(TargetBase::Symbol {
            name: symbol.name.clone(),
            ty: symbol.ty,
            register: symbol.register,
        })
    }

    /// Returns the target indexed by `key`.
    pub fn with_key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    /// Returns the target with `flags` added.
    pub fn with_flags(mut self, flags: TargetFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Returns the target with a `:named` alias.
    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    /// Returns the symbol name, `None` for registers.
    pub fn name(&self) -> Option<&str> {
        match &self.base {
            TargetBase::Register { .. } => None,
            TargetBase::Symbol { name, .. } => Some(name),
        }
    }

    /// Returns the declared or register type.
    pub fn value_type(&self) -> ValueType {
        match self.base {
            TargetBase::Register { ty, .. } | TargetBase::Symbol { ty, .. } => ty,
        }
    }

    fn same_storage(&self, other: &Self) -> bool {
        match (&self.base, &other.base) {
            (
                TargetBase::Register { ty, number },
                TargetBase::Register {
                    ty: other_ty,
                    number: other_number,
                },
            ) => ty == other_ty && number == other_number,
            (TargetBase::Symbol { name, .. }, TargetBase::Symbol { name: other, .. }) => {
                name == other
            }
            _ => false,
        }
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        self.same_storage(other) && self.key == other.key
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            TargetBase::Register { ty, number } => {
                write!(f, "${}{number}", ty.register_letter().unwrap_or('?'))?;
            }
            TargetBase::Symbol { name, .. } => f.write_str(name)?,
        }
        if let Some(key) = &self.key {
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Keys and expressions
// ---------------------------------------------------------------------------

/// Non-empty `[a; b; ...]` index chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    entries: Vec<Expression>,
}

impl Key {
    /// Creates a key with one entry.
    pub fn new(first: impl Into<Expression>) -> Self {
        Self {
            entries: vec![first.into()],
        }
    }

    /// Builds a key from entries; `None` when `entries` is empty.
    pub fn from_entries(entries: Vec<Expression>) -> Option<Self> {
        (!entries.is_empty()).then_some(Self { entries })
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: impl Into<Expression>) {
        self.entries.push(entry.into());
    }

    pub fn entries(&self) -> &[Expression] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the key has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, entry) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(";")?;
            }
            write!(f, "{entry}")?;
        }
        f.write_str("]")
    }
}

/// Operand value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Target(Target),
    Constant(Constant),
    Key(Key),
    /// Branch destination.
    Label(String),
}

impl Expression {
    pub fn as_target(&self) -> Option<&Target> {
        match self {
            Self::Target(target) => Some(target),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Self::Constant(constant) => Some(constant),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            Self::Label(label) => Some(label),
            _ => None,
        }
    }
}

impl From<Target> for Expression {
    fn from(target: Target) -> Self {
        Self::Target(target)
    }
}

impl From<Constant> for Expression {
    fn from(constant: Constant) -> Self {
        Self::Constant(constant)
    }
}

impl From<Key> for Expression {
    fn from(key: Key) -> Self {
        Self::Key(key)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target(target) => target.fmt(f),
            Self::Constant(constant) => constant.fmt(f),
            Self::Key(key) => key.fmt(f),
            Self::Label(label) => f.write_str(label),
        }
    }
}

// ---------------------------------------------------------------------------
// Invocations
// ---------------------------------------------------------------------------

/// Call or return argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub value: Expression,
    pub flags: ArgFlags,
    /// Name given by `"alias" => value` or `:named("alias")`.
    pub alias: Option<String>,
}

impl Argument {
    /// Creates a positional argument.
    pub fn new(value: impl Into<Expression>) -> Self {
        Self {
            value: value.into(),
            flags: ArgFlags::empty(),
            alias: None,
        }
    }

    /// Creates a `"alias" => value` argument.
    pub fn named(alias: impl Into<String>, value: impl Into<Expression>) -> Self {
        Self {
            value: value.into(),
            flags: ArgFlags::NAMED,
            alias: Some(alias.into()),
        }
    }

    /// Returns the argument with `flags` added.
    pub fn with_flags(mut self, flags: ArgFlags) -> Self {
        self.flags |= flags;
        self
    }
}

/// Invocation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Parrot calling convention sub call.
    Pcc,
    /// Native call through `.nci_call`.
    Nci,
    /// `obj.method(...)`.
    Method,
    /// `.tailcall sub(...)`.
    Tailcall,
    /// `.tailcall obj.method(...)`.
    MethodTailcall,
    /// `.return (...)` or a `.begin_return` block.
    Return,
    /// `.yield (...)` or a `.begin_yield` block.
    Yield,
}

/// Sub call, method call, return, or yield.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub kind: CallKind,
    /// Invoked sub, or the invocant of a method call.
    pub callee: Option<Expression>,
    /// Method name or method object.
    pub method: Option<Expression>,
    /// Return continuation from `.call sub, retcont`.
    pub retcont: Option<Target>,
    pub arguments: Vec<Argument>,
    pub results: Vec<Target>,
    pub label: Option<String>,
}

impl Invocation {
    /// Creates an invocation of `kind` with nothing attached.
    pub fn new(kind: CallKind) -> Self {
        Self {
            kind,
            callee: None,
            method: None,
            retcont: None,
            arguments: Vec::new(),
            results: Vec::new(),
            label: None,
        }
    }

    /// Creates a sub call.
    pub fn sub_call(callee: impl Into<Expression>, arguments: Vec<Argument>) -> Self {
        Self {
            callee: Some(callee.into()),
            arguments,
            ..Self::new(CallKind::Pcc)
        }
    }

    /// Creates a method call on `invocant`.
    pub fn method_call(invocant: Target, method: Expression, arguments: Vec<Argument>) -> Self {
        Self {
            callee: Some(Expression::Target(invocant)),
            method: Some(method),
            arguments,
            ..Self::new(CallKind::Method)
        }
    }
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// Operand list; almost every instruction has three operands or fewer.
pub type Operands = SmallVec<[Expression; 3]>;

/// One VM instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub label: Option<String>,
    pub opcode: String,
    pub operands: Operands,
}

impl Instruction {
    /// Creates an instruction with no operands.
    pub fn new(opcode: impl Into<String>) -> Self {
        Self {
            label: None,
            opcode: opcode.into(),
            operands: Operands::new(),
        }
    }

    /// Creates an instruction with the given operands.
    pub fn with_operands(
        opcode: impl Into<String>,
        operands: impl IntoIterator<Item = Expression>,
    ) -> Self {
        Self {
            label: None,
            opcode: opcode.into(),
            operands: operands.into_iter().collect(),
        }
    }

    /// Appends any operand.
    pub fn push(&mut self, operand: impl Into<Expression>) -> &mut Self {
        self.operands.push(operand.into());
        self
    }

    pub fn push_target(&mut self, target: Target) -> &mut Self {
        self.push(target)
    }

    pub fn push_int(&mut self, value: i64) -> &mut Self {
        self.push(Constant::int(value))
    }

    pub fn push_label(&mut self, label: impl Into<String>) -> &mut Self {
        self.operands.push(Expression::Label(label.into()));
        self
    }

    /// Returns the operand at `index` (0-based).
    pub fn operand(&self, index: usize) -> Option<&Expression> {
        self.operands.get(index)
    }

    pub fn operand_count(&self) -> usize {
        self.operands.len()
    }

    /// Removes and returns the operand at `index`.
    pub fn remove_operand(&mut self, index: usize) -> Option<Expression> {
        (index < self.operands.len()).then(|| self.operands.remove(index))
    }

    /// Replaces the opcode, keeping operands and label.
    pub fn set_opcode(&mut self, opcode: &str) {
        opcode.clone_into(&mut self.opcode);
    }

    /// Labels referenced by this instruction's operands.
    pub fn label_operands(&self) -> impl Iterator<Item = &str> {
        self.operands.iter().filter_map(Expression::as_label)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{label}: ")?;
        }
        f.write_str(&self.opcode)?;
        for (index, operand) in self.operands.iter().enumerate() {
            f.write_str(if index == 0 { " " } else { ", " })?;
            write!(f, "{operand}")?;
        }
        Ok(())
    }
}

/// Subroutine body element.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Instruction(Instruction),
    Invocation(Invocation),
}

impl Statement {
    pub fn as_instruction(&self) -> Option<&Instruction> {
        match self {
            Self::Instruction(instruction) => Some(instruction),
            Self::Invocation(_) => None,
        }
    }

    pub fn as_invocation(&self) -> Option<&Invocation> {
        match self {
            Self::Invocation(invocation) => Some(invocation),
            Self::Instruction(_) => None,
        }
    }

    /// Returns the statement label.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Instruction(instruction) => instruction.label.as_deref(),
            Self::Invocation(invocation) => invocation.label.as_deref(),
        }
    }

    pub(crate) fn set_label(&mut self, label: String) {
        match self {
            Self::Instruction(instruction) => instruction.label = Some(label),
            Self::Invocation(invocation) => invocation.label = Some(label),
        }
    }
}
