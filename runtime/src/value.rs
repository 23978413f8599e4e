//! FILENAME: runtime/src/value.rs
//! PURPOSE: The tagged value model every expression evaluates to.
//! CONTEXT: Values form a small closed set of kinds. Arithmetic never
//! mutates a value; operators always construct a new one. The numeric
//! kinds (Integer, Float, Exact) additionally expose a capability view
//! through `number()` so operators can pick a computation tier without
//! matching on concrete kinds (see numeric.rs).
//!
//! SUPPORTED KINDS:
//! - Undefined: the absence marker produced by unknown-name lookups
//! - Integer:   64-bit signed integer
//! - Float:     IEEE 754 double
//! - Exact:     fixed-point decimal (28 significant digits)
//! - Boolean, Text
//! - Function:  a host-provided native callable

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::ser::{Serialize, Serializer};

use crate::error::EvalError;
use crate::numeric::Numeric;

/// A single evaluation result or scope entry.
#[derive(Debug, Clone)]
pub enum Value {
    /// Produced by looking up a name the scope does not define.
    Undefined,
    Integer(i64),
    Float(f64),
    /// Fixed-point decimal; chosen for fractional literals that fit its
    /// precision so `0.1 + 0.2` stays exact.
    Exact(Decimal),
    Boolean(bool),
    Text(String),
    Function(NativeFunction),
}

/// The kind tag of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ValueKind {
    Undefined,
    Integer,
    Float,
    Exact,
    Boolean,
    Text,
    Function,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Undefined => "undefined",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Exact => "exact",
            ValueKind::Boolean => "boolean",
            ValueKind::Text => "text",
            ValueKind::Function => "function",
        };
        write!(f, "{}", name)
    }
}

impl Value {
    /// Wraps a host-native callable as a function value.
    pub fn function<F>(name: &str, body: F) -> Value
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Value::Function(NativeFunction {
            name: Arc::from(name),
            body: Arc::new(body),
        })
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Undefined => ValueKind::Undefined,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Exact(_) => ValueKind::Exact,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Text(_) => ValueKind::Text,
            Value::Function(_) => ValueKind::Function,
        }
    }

    /// The numeric capability view, present only for the numeric kinds.
    pub fn number(&self) -> Option<Numeric> {
        match self {
            Value::Integer(n) => Some(Numeric::Integer(*n)),
            Value::Float(f) => Some(Numeric::Float(*f)),
            Value::Exact(d) => Some(Numeric::Exact(*d)),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        self.number().is_some()
    }

    /// Value equality as the `==` operator sees it.
    ///
    /// Numeric kinds compare after tier promotion, so `1 == 1.0` holds.
    /// Undefined equals only undefined. Functions compare by callable
    /// identity, everything else structurally.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Undefined, _) | (_, Value::Undefined) => false,
            (Value::Boolean(l), Value::Boolean(r)) => l == r,
            (Value::Text(l), Value::Text(r)) => l == r,
            (Value::Function(l), Value::Function(r)) => l.same_callable(r),
            _ => match (self.number(), other.number()) {
                (Some(l), Some(r)) => match crate::numeric::promote(l, r) {
                    crate::numeric::Promoted::Integer(a, b) => a == b,
                    crate::numeric::Promoted::Exact(a, b) => a == b,
                    crate::numeric::Promoted::Float(a, b) => a == b,
                },
                _ => false,
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.equals(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => {
                // Format integral doubles without a fractional part
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Exact(d) => write!(f, "{}", d),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Text(t) => write!(f, "{}", t),
            Value::Function(func) => write!(f, "<function {}>", func.name()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined => serializer.serialize_unit(),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Exact(d) => Serialize::serialize(d, serializer),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Text(t) => serializer.serialize_str(t),
            Value::Function(_) => serializer.serialize_str(&self.to_string()),
        }
    }
}

/// A named host-provided callable.
///
/// Cloning shares the underlying closure; two clones compare equal.
#[derive(Clone)]
pub struct NativeFunction {
    name: Arc<str>,
    body: Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>,
}

impl NativeFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the callable. Argument-count or argument-type rejections
    /// come back as [`EvalError::InvalidCall`] raised by the body itself.
    pub fn invoke(&self, arguments: &[Value]) -> Result<Value, EvalError> {
        (self.body)(arguments)
    }

    pub(crate) fn same_callable(&self, other: &NativeFunction) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
