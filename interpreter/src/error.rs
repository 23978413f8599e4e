//! FILENAME: interpreter/src/error.rs
//! PURPOSE: Parse-time and combined error types for the interpreter.

use thiserror::Error;

use runtime::EvalError;

/// No grammar rule could derive a valid parse while input remained.
/// Fatal for the whole source text; cached parse state for other texts
/// is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at offset {position}: no grammar rule matches near '{fragment}'")]
pub struct SyntaxError {
    /// Byte offset of the first unparseable position.
    pub position: usize,
    /// A short slice of the offending source for diagnostics.
    pub fragment: String,
}

/// Either phase of the interpret-then-evaluate convenience path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpretError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}
