//! FILENAME: runtime/src/error.rs
//! PURPOSE: Errors raised while evaluating an expression program.

use thiserror::Error;

/// Errors produced by node evaluation.
///
/// Looking up an unknown name is *not* an error; it yields the undefined
/// value, which only fails later when an operator demands a capability the
/// absent value lacks (and lands in one of the variants below).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// An operand did not satisfy an operator's type precondition.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A call target was not callable, or the callable rejected its arguments.
    #[error("invalid call: {0}")]
    InvalidCall(String),

    /// Division by zero, overflow, or an out-of-range shift.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),
}
