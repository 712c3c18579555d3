//! Intermediate representation and the semantic core that builds it.
//!
//! Leaves first: value types and constants, the symbol table, IR nodes, then
//! the folding, truthiness, strength-reduction, and branch-resolution passes,
//! and finally the [`Builder`] that drives them per grammar production.

pub mod branch;
pub mod builder;
pub mod constant;
pub mod error;
pub mod flags;
pub mod fold;
pub mod ids;
pub mod node;
pub mod opcode;
pub mod operator;
pub mod reduce;
pub mod symbol;
pub mod truth;
pub mod types;
pub mod unit;
pub mod verify;

pub use branch::{Condition, Polarity};
pub use builder::{BuildOptions, Builder, PmcObject};
pub use constant::{ConstValue, Constant};
pub use error::{BuildResult, Diagnostic, DiagnosticKind, Fatal};
pub use flags::{ArgFlags, SubFlags, TargetFlags};
pub use fold::{evaluate, fold, FoldError};
pub use ids::{RegisterId, SubId};
pub use node::{
    Argument, CallKind, Expression, Instruction, Invocation, Key, Operands, Statement, Target,
    TargetBase,
};
pub use opcode::OpcodeTable;
pub use operator::{BinaryOp, RelOp, UnaryOp};
pub use reduce::{reduce, Reduction};
pub use symbol::{Symbol, SymbolError, SymbolTable};
pub use truth::{string_truthy, truthy, TruthError};
pub use types::ValueType;
pub use unit::{CompilationUnit, Lexical, Parameter, Subroutine};
pub use verify::{verify_unit, VerifyError, VerifyErrorKind};
