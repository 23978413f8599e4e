//! FILENAME: interpreter/src/lib.rs
//! PURPOSE: Library root for the expression interpreter.
//! CONTEXT: This crate turns source text into executable programs through a
//! packrat-memoized, backtracking, priority-bounded rule engine, and
//! evaluates them against a scope from the runtime crate.
//!
//! PIPELINE: Source Text --> Reader (scans + caches) --> Rule Engine
//!           --> Executable Nodes --> Program --> Value
//!
//! A host embeds this crate through two extension points only: custom
//! grammar rules (`Interpreter::with_rules`) and native callables
//! (`Value::function` defined into a `Scope`). There is no CLI, wire
//! format, or file format; hosts supply text and a scope and get a value.

pub mod engine;
pub mod error;
pub mod process;
pub mod program;
pub mod reader;
pub mod syntax;

// Re-export commonly used types at the crate root
pub use engine::Interpreter;
pub use error::{InterpretError, SyntaxError};
pub use process::{Binding, Constant, Declaration, FieldRef, FunctionCall, Operation, Operator, Process};
pub use program::{evaluate, interpret, Program};
pub use reader::{Reader, ReaderCache, Scan, ScanKind};
pub use syntax::{Syntax, CEILING_ARGUMENT, CEILING_LOOSEST, PRIORITY_ATOM, PRIORITY_DECLARATION};

// The runtime types hosts handle directly
pub use runtime::{EvalError, NativeFunction, Scope, Value, ValueKind};

#[cfg(test)]
mod tests;
