//! Per-subroutine symbol table.

use indexmap::IndexMap;
use thiserror::Error;

use crate::ir::ids::RegisterId;
use crate::ir::types::ValueType;

/// A declared identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Identifier as written.
    pub name: String,
    /// Declared type.
    pub ty: ValueType,
    /// Register assigned at declaration; `None` for placeholders.
    pub register: Option<RegisterId>,
    /// Declared with `:unique_reg`.
    pub unique_reg: bool,
}

impl Symbol {
    /// Creates a symbol that lives outside any table, used to keep building
    /// after a lookup failure.
    pub fn placeholder(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            register: None,
            unique_reg: false,
        }
    }

    /// Returns `true` for symbols produced by [`Symbol::placeholder`].
    pub fn is_placeholder(&self) -> bool {
        self.register.is_none()
    }
}

/// Symbol table failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    /// The name is already bound in this scope.
    #[error("symbol '{name}' is already declared")]
    Duplicate {
        name: String,
        /// Type of the retained first declaration.
        existing: ValueType,
    },
}

/// Insertion-ordered map from identifier to [`Symbol`].
///
/// Registers are handed out sequentially per type, so the first `int` local
/// gets `RegisterId(0)`, the first `pmc` local also gets `RegisterId(0)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
    next_register: [u32; 5],
}

impl SymbolTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name`. A redeclaration fails and keeps the first binding.
    pub fn declare(
        &mut self,
        name: &str,
        ty: ValueType,
        unique_reg: bool,
    ) -> Result<&Symbol, SymbolError> {
        if let Some(existing) = self.symbols.get(name) {
            return Err(SymbolError::Duplicate {
                name: name.to_string(),
                existing: existing.ty,
            });
        }

        let slot = &mut self.next_register[ty.slot()];
        let register = RegisterId::new(*slot);
        *slot += 1;

        let entry = self.symbols.entry(name.to_string()).or_insert(Symbol {
            name: name.to_string(),
            ty,
            register: Some(register),
            unique_reg,
        });
        Ok(entry)
    }

    /// Finds a declared symbol.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Returns the number of declared symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` when nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterates symbols in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
}
