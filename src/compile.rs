//! One-call front end: scan, parse, build, and verify labels.

use thiserror::Error;

use crate::ir::{
    verify_unit, BuildOptions, Builder, CompilationUnit, Diagnostic, Fatal, VerifyError,
};
use crate::lexer::Lexer;
use crate::parser::{Parser, TokenStream};

/// A successfully built unit. `diagnostics` may still hold recovered
/// errors below the threshold.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub unit: CompilationUnit,
    pub diagnostics: Vec<Diagnostic>,
    /// Label problems found after the build. Empty when verification is
    /// turned off.
    pub unresolved_labels: Vec<VerifyError>,
}

impl CompileOutput {
    /// Returns `true` when nothing at all was reported.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && self.unresolved_labels.is_empty()
    }
}

/// Build abandoned before the end of input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("too many errors ({}), compilation aborted", diagnostics.len())]
    TooManyErrors { diagnostics: Vec<Diagnostic> },
    #[error("internal error: {message}")]
    Internal {
        message: String,
        diagnostics: Vec<Diagnostic>,
    },
}

impl CompileError {
    /// Diagnostics reported before the build stopped.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::TooManyErrors { diagnostics } | Self::Internal { diagnostics, .. } => diagnostics,
        }
    }
}

/// Compiles PIR `source` into a [`CompilationUnit`].
pub fn compile(source: &str, options: BuildOptions) -> Result<CompileOutput, CompileError> {
    let verify_labels = options.verify_labels;
    let tokens = TokenStream::new(Lexer::new(source));
    let mut parser = Parser::new(tokens, Builder::new(options));
    let outcome = parser.parse_unit();
    let (unit, diagnostics) = parser.finish();

    match outcome {
        Ok(()) => {}
        Err(Fatal::TooManyErrors { .. }) => {
            log::warn!("compilation aborted after {} errors", diagnostics.len());
            return Err(CompileError::TooManyErrors { diagnostics });
        }
        Err(Fatal::Internal { message }) => {
            return Err(CompileError::Internal {
                message,
                diagnostics,
            });
        }
    }

    let unresolved_labels = if verify_labels {
        verify_unit(&unit)
    } else {
        Vec::new()
    };
    for error in &unresolved_labels {
        log::debug!("{error}");
    }
    log::debug!(
        "compiled {} subroutines with {} diagnostics",
        unit.subroutines.len(),
        diagnostics.len()
    );
    Ok(CompileOutput {
        unit,
        diagnostics,
        unresolved_labels,
    })
}
