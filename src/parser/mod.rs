//! PIR recognizer.
//!
//! A recursive-descent parser over a bounded-lookahead token stream. It does
//! not build a syntax tree; each construct goes straight to an
//! [`crate::ir::Builder`] action.

pub mod error;
pub mod parser;
pub mod recovery;
pub mod token_stream;

pub use error::{ParseError, ParseErrorKind};
pub use parser::Parser;
pub use recovery::{ParseFailure, ParseResult};
pub use token_stream::{TokenStream, MAX_LOOKAHEAD};
