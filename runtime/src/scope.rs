//! FILENAME: runtime/src/scope.rs
//! PURPOSE: The flat mutable name-to-value table a program evaluates against.
//! CONTEXT: One scope per evaluation run, created by the caller and passed
//! by reference through every node evaluation. Only variable-declaration
//! nodes write to it. There is no nesting: `define` always writes the same
//! table `lookup` reads, so declarations are overwritable at any point.

use std::collections::HashMap;

use crate::value::Value;

/// Flat, case-sensitive name-to-value mapping.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    values: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Scope {
        Scope::default()
    }

    /// Returns the value bound to `name`, or `None` when undefined.
    /// Absence is not an error; callers map it to `Value::Undefined`.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Binds `name`, overwriting any previous binding.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
