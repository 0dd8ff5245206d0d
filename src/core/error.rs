// This module defines the error taxonomy of the bulan compiler using the thiserror crate.
// CompileError covers the four families of failures the pipeline can report: lexical errors
// (unterminated literals, bad escapes, stray characters), syntax errors (an expected token
// kind versus the one found), semantic errors (unknown or duplicate identifiers)
// and generator-contract errors (an instruction operand of the wrong kind reaching a
// backend). Every variant carries the source location it is reported at, and its Display
// output is the `<file>:<line>:<col>: <message>` line printed by the diagnostics sink.
// Lexical errors may also carry a secondary location pointing at the start of the literal.

//! Error types for the bulan compiler.

use thiserror::Error;

use super::diagnostics::Loc;
use crate::frontend::token::TokenKind;
use crate::ir::{ArgKind, InstKind};

/// Main error type for compiling a program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("{loc}: LEXER ERROR: {message}")]
    Lex {
        loc: Loc,
        message: String,
        /// Where the offending literal starts, if any.
        literal_start: Option<Loc>,
    },

    #[error("{loc}: ERROR: expected {expected}, but got {found}")]
    UnexpectedToken {
        loc: Loc,
        expected: String,
        found: TokenKind,
    },

    #[error("{loc}: ERROR: unexpected {found} to start a statement")]
    InvalidStatement { loc: Loc, found: TokenKind },

    #[error("{loc}: ERROR: invalid token {found} to start an expression")]
    InvalidExpression { loc: Loc, found: TokenKind },

    #[error("{loc}: ERROR: invalid follow up token {found} after identifier `{name}`")]
    InvalidFollowUp {
        loc: Loc,
        name: String,
        found: TokenKind,
    },

    #[error("{loc}: ERROR: could not find `{name}` in scope")]
    UnknownIdentifier { loc: Loc, name: String },

    #[error("{loc}: ERROR: variable with name `{name}` already exists")]
    DuplicateLocal { loc: Loc, name: String },

    #[error(
        "{loc}: CODEGEN ERROR: expecting argument {index} of instruction {inst} to be {expected} but found {found}"
    )]
    UnexpectedArg {
        loc: Loc,
        inst: InstKind,
        index: usize,
        expected: &'static str,
        found: ArgKind,
    },
}

impl CompileError {
    /// Location the error is reported at.
    pub fn loc(&self) -> &Loc {
        match self {
            CompileError::Lex { loc, .. }
            | CompileError::UnexpectedToken { loc, .. }
            | CompileError::InvalidStatement { loc, .. }
            | CompileError::InvalidExpression { loc, .. }
            | CompileError::InvalidFollowUp { loc, .. }
            | CompileError::UnknownIdentifier { loc, .. }
            | CompileError::DuplicateLocal { loc, .. }
            | CompileError::UnexpectedArg { loc, .. } => loc,
        }
    }

    /// Secondary diagnostic lines that accompany the primary one.
    pub fn notes(&self) -> Vec<String> {
        match self {
            CompileError::Lex {
                literal_start: Some(start),
                ..
            } => vec![format!("{start}: LEXER INFO: literal starts here")],
            _ => Vec::new(),
        }
    }
}

/// Result type alias for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;
