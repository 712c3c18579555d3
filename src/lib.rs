//! Library entrypoint for `pirc`.
//!
//! The crate exposes the PIR lexer, the recognizer, and the intermediate
//! representation it builds. [`compile`] runs all three over one source text.

pub mod compile;
pub mod ir;
pub mod lexer;
pub mod parser;

pub use compile::{compile, CompileError, CompileOutput};
