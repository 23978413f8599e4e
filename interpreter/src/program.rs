//! FILENAME: interpreter/src/program.rs
//! PURPOSE: The top-level interpret loop and the resulting program value.
//! CONTEXT: A program is an ordered sequence of top-level units. The driver
//! repeatedly asks the engine for one unit at the loosest ceiling, skipping
//! `;` separators between units; if input remains but nothing parses, the
//! whole text is rejected with a syntax error. Evaluation runs the units in
//! order against one scope and returns the last unit's value.

use log::debug;

use runtime::{EvalError, Scope, Value};

use crate::engine::{Interpreter, DEFAULT};
use crate::error::{InterpretError, SyntaxError};
use crate::process::Process;
use crate::reader::Reader;
use crate::syntax::CEILING_LOOSEST;

use std::sync::Arc;

/// How much source context a syntax error carries.
const ERROR_FRAGMENT_LEN: usize = 16;

/// A parsed program: reusable, shareable, evaluated any number of times.
#[derive(Clone)]
pub struct Program {
    units: Vec<Arc<dyn Process>>,
}

impl Program {
    /// Evaluates the units in order against `scope`, returning the last
    /// unit's value (undefined for an empty program). Declarations commit
    /// to the scope as they evaluate, left to right, and stay visible even
    /// when a later unit fails.
    pub fn evaluate(&self, scope: &mut Scope) -> Result<Value, EvalError> {
        let mut last = Value::Undefined;
        for unit in &self.units {
            last = unit.evaluate(scope)?;
        }
        Ok(last)
    }

    /// Evaluates against a fresh empty scope.
    pub fn evaluate_new(&self) -> Result<Value, EvalError> {
        let mut scope = Scope::new();
        self.evaluate(&mut scope)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl Interpreter {
    /// Parses `source` into a program, reusing any cached parse state for
    /// this exact text.
    pub fn interpret_program(&self, source: &str) -> Result<Program, SyntaxError> {
        let cache = self.reader_cache(source);
        let mut reader = Reader::with_cache(source, cache);
        let mut units = Vec::new();
        loop {
            while reader.eat_char(';') {}
            reader.skip_whitespace();
            if reader.at_end() {
                break;
            }
            match self.interpret(&mut reader, CEILING_LOOSEST) {
                Some(unit) => units.push(unit),
                None => return Err(syntax_error(&reader)),
            }
        }
        debug!("interpreted program with {} unit(s)", units.len());
        Ok(Program { units })
    }
}

fn syntax_error(reader: &Reader) -> SyntaxError {
    let position = reader.position();
    let fragment: String = reader.source()[position..].chars().take(ERROR_FRAGMENT_LEN).collect();
    SyntaxError { position, fragment }
}

/// Parses `source` with the shared default engine.
pub fn interpret(source: &str) -> Result<Program, SyntaxError> {
    DEFAULT.interpret_program(source)
}

/// Parses `source` and evaluates it against a fresh scope in one step.
pub fn evaluate(source: &str) -> Result<Value, InterpretError> {
    let program = interpret(source)?;
    Ok(program.evaluate_new()?)
}
