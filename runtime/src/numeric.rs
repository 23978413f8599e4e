//! FILENAME: runtime/src/numeric.rs
//! PURPOSE: Numeric capability view and tier promotion for mixed operands.
//! CONTEXT: Arithmetic and comparison operators never inspect concrete
//! value kinds; they ask both operands for their `Numeric` reading and let
//! `promote` pick the computation tier:
//!
//!   either operand float  --> compute in f64
//!   else either exact     --> compute in fixed-point decimal
//!   else                  --> compute in i64 (checked)
//!
//! This keeps mixed-kind expressions predictable: `1 + 2.5` is float work,
//! `1 + 0.5m-style exact` stays exact, `1 + 2` stays integral.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// The numeric reading of a value, detached from the `Value` enum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Integer(i64),
    Float(f64),
    Exact(Decimal),
}

impl Numeric {
    pub fn is_float(&self) -> bool {
        matches!(self, Numeric::Float(_))
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Numeric::Exact(_))
    }

    /// Floating-point reading. Always available; decimals that fall outside
    /// the f64 range read as NaN.
    pub fn to_f64(&self) -> f64 {
        match self {
            Numeric::Integer(n) => *n as f64,
            Numeric::Float(f) => *f,
            Numeric::Exact(d) => d.to_f64().unwrap_or(f64::NAN),
        }
    }

    /// Exact-decimal reading. Fails for non-finite floats and floats
    /// beyond decimal precision.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Numeric::Integer(n) => Some(Decimal::from(*n)),
            Numeric::Float(f) => Decimal::from_f64(*f),
            Numeric::Exact(d) => Some(*d),
        }
    }

    /// Integral reading: the value itself for integers, and floats or
    /// decimals only when they carry no fractional part and fit in i64.
    /// Shift and bitwise operators use this.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Numeric::Integer(n) => Some(*n),
            Numeric::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            Numeric::Exact(d) => {
                if d.fract().is_zero() {
                    d.to_i64()
                } else {
                    None
                }
            }
        }
    }
}

/// A pair of operands promoted to their common computation tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Promoted {
    Integer(i64, i64),
    Exact(Decimal, Decimal),
    Float(f64, f64),
}

/// Promotes two numeric readings to the loosest tier either requires.
pub fn promote(left: Numeric, right: Numeric) -> Promoted {
    match (left, right) {
        (Numeric::Float(a), b) => Promoted::Float(a, b.to_f64()),
        (a, Numeric::Float(b)) => Promoted::Float(a.to_f64(), b),
        (Numeric::Exact(a), Numeric::Exact(b)) => Promoted::Exact(a, b),
        (Numeric::Exact(a), Numeric::Integer(b)) => Promoted::Exact(a, Decimal::from(b)),
        (Numeric::Integer(a), Numeric::Exact(b)) => Promoted::Exact(Decimal::from(a), b),
        (Numeric::Integer(a), Numeric::Integer(b)) => Promoted::Integer(a, b),
    }
}
