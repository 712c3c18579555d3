//! Compilation unit and subroutine containers.

use indexmap::IndexMap;

use crate::ir::constant::Constant;
use crate::ir::flags::SubFlags;
use crate::ir::ids::SubId;
use crate::ir::node::{Instruction, Key, Statement, Target};
use crate::ir::symbol::SymbolTable;

/// `.param` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Symbol target carrying the parameter flags.
    pub target: Target,
    /// Type named by `:invocant(type)`.
    pub invocant_type: Option<String>,
}

/// `.lex "name", target` binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexical {
    pub name: String,
    pub target: Target,
}

/// One `.sub ... .end` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Subroutine {
    pub name: String,
    pub flags: SubFlags,
    /// `:outer(name)`.
    pub outer: Option<String>,
    /// `:vtable` or `:vtable("name")`; a bare flag uses the sub name.
    pub vtable: Option<String>,
    /// `:lexid("id")`.
    pub lexid: Option<String>,
    /// `:instanceof("class")`.
    pub instanceof: Option<String>,
    /// Namespace active when `.sub` was read.
    pub namespace: Option<Key>,
    pub parameters: Vec<Parameter>,
    pub lexicals: Vec<Lexical>,
    /// `.const` declarations local to the body.
    pub constants: IndexMap<String, Constant>,
    pub statements: Vec<Statement>,
    /// Label name to the index of the statement it precedes.
    pub labels: IndexMap<String, usize>,
    pub symbols: SymbolTable,
}

impl Subroutine {
    /// Creates an empty subroutine.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: SubFlags::empty(),
            outer: None,
            vtable: None,
            lexid: None,
            instanceof: None,
            namespace: None,
            parameters: Vec::new(),
            lexicals: Vec::new(),
            constants: IndexMap::new(),
            statements: Vec::new(),
            labels: IndexMap::new(),
            symbols: SymbolTable::new(),
        }
    }

    /// Iterates the plain instructions of the body, skipping invocations.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.statements.iter().filter_map(Statement::as_instruction)
    }

    /// Returns the statement index a label resolves to.
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }
}

/// Everything built from one source text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilationUnit {
    /// Closed subroutines in source order.
    pub subroutines: Vec<Subroutine>,
    /// `.globalconst` declarations.
    pub global_constants: IndexMap<String, Constant>,
    /// File-level `.const` declarations.
    pub constants: IndexMap<String, Constant>,
    /// Namespace set by the latest `.namespace`.
    pub namespace: Option<Key>,
    /// `.HLL "name"`.
    pub hll: Option<String>,
    /// `.HLL_map "core" = "hll"` pairs.
    pub hll_map: IndexMap<String, String>,
    /// `.loadlib "name"` in order.
    pub libraries: Vec<String>,
}

impl CompilationUnit {
    /// Creates an empty unit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the subroutine for an id handed out by the builder.
    pub fn subroutine(&self, id: SubId) -> Option<&Subroutine> {
        self.subroutines.get(id.value() as usize)
    }

    /// Finds a subroutine by name.
    pub fn find_subroutine(&self, name: &str) -> Option<&Subroutine> {
        self.subroutines.iter().find(|sub| sub.name == name)
    }
}
