//! FILENAME: interpreter/src/process.rs
//! PURPOSE: Executable nodes produced by grammar rules, and their evaluation.
//! CONTEXT: A node is the compiled form of one grammar production. Nodes are
//! immutable and shared (`Arc`): the position cache hands the same instance
//! to every later parse of identical input, and one instance may be
//! re-evaluated against any number of scopes. Evaluation is a pure function
//! of the scope except for variable declarations, which write to it.
//!
//! SUPPORTED NODES:
//! - Constant: literal values
//! - FieldRef: bare-name lookup (undefined names yield Value::Undefined)
//! - FunctionCall: scope-resolved native-callable invocation
//! - Declaration: `var a = expr, b = expr` binding list
//! - Operation: the seventeen binary operators, including the
//!   short-circuit forms && and ||

use std::sync::Arc;

use runtime::numeric::{promote, Promoted};
use runtime::{EvalError, Scope, Value};

/// One executable unit of a parsed program.
///
/// Implementations must be `Send + Sync`: nodes are cached process-wide and
/// may be evaluated from any thread.
pub trait Process: Send + Sync {
    fn evaluate(&self, scope: &mut Scope) -> Result<Value, EvalError>;
}

/// A literal value.
pub struct Constant {
    value: Value,
}

impl Constant {
    pub fn new(value: Value) -> Constant {
        Constant { value }
    }
}

impl Process for Constant {
    fn evaluate(&self, _scope: &mut Scope) -> Result<Value, EvalError> {
        Ok(self.value.clone())
    }
}

/// A bare name, resolved against the scope at evaluation time.
pub struct FieldRef {
    name: String,
}

impl FieldRef {
    pub fn new(name: String) -> FieldRef {
        FieldRef { name }
    }
}

impl Process for FieldRef {
    fn evaluate(&self, scope: &mut Scope) -> Result<Value, EvalError> {
        Ok(scope.lookup(&self.name).cloned().unwrap_or(Value::Undefined))
    }
}

/// `name(arg, arg, ...)` — the name must resolve to a function value.
pub struct FunctionCall {
    name: String,
    arguments: Vec<Arc<dyn Process>>,
}

impl FunctionCall {
    pub fn new(name: String, arguments: Vec<Arc<dyn Process>>) -> FunctionCall {
        FunctionCall { name, arguments }
    }
}

impl Process for FunctionCall {
    fn evaluate(&self, scope: &mut Scope) -> Result<Value, EvalError> {
        let target = scope.lookup(&self.name).cloned().unwrap_or(Value::Undefined);
        let function = match target {
            Value::Function(function) => function,
            other => {
                return Err(EvalError::InvalidCall(format!(
                    "'{}' is not a function (found {})",
                    self.name,
                    other.kind()
                )))
            }
        };
        let mut arguments = Vec::with_capacity(self.arguments.len());
        for argument in &self.arguments {
            arguments.push(argument.evaluate(scope)?);
        }
        function.invoke(&arguments)
    }
}

/// One `name` or `name = initializer` entry of a declaration list.
pub struct Binding {
    pub name: String,
    pub initializer: Option<Arc<dyn Process>>,
}

/// `var a = expr, b = expr, ...`
///
/// Bindings commit to the scope left to right as they evaluate, so a later
/// initializer sees the earlier bindings — and on failure the bindings
/// already evaluated stay visible. Yields the last binding's value.
pub struct Declaration {
    bindings: Vec<Binding>,
}

impl Declaration {
    pub fn new(bindings: Vec<Binding>) -> Declaration {
        Declaration { bindings }
    }
}

impl Process for Declaration {
    fn evaluate(&self, scope: &mut Scope) -> Result<Value, EvalError> {
        let mut last = Value::Undefined;
        for binding in &self.bindings {
            let value = match &binding.initializer {
                Some(initializer) => initializer.evaluate(scope)?,
                None => Value::Undefined,
            };
            scope.define(binding.name.clone(), value.clone());
            last = value;
        }
        Ok(last)
    }
}

/// The binary operator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    ShiftLeft,
    ShiftRight,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl Operator {
    /// The source token, for diagnostics.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Remainder => "%",
            Operator::ShiftLeft => "<<",
            Operator::ShiftRight => ">>",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::LessEqual => "<=",
            Operator::GreaterEqual => ">=",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::BitAnd => "&",
            Operator::BitXor => "^",
            Operator::BitOr => "|",
            Operator::And => "&&",
            Operator::Or => "||",
        }
    }
}

/// A binary operator applied to two sub-expressions.
pub struct Operation {
    operator: Operator,
    left: Arc<dyn Process>,
    right: Arc<dyn Process>,
}

impl Operation {
    pub fn new(operator: Operator, left: Arc<dyn Process>, right: Arc<dyn Process>) -> Operation {
        Operation { operator, left, right }
    }
}

impl Process for Operation {
    fn evaluate(&self, scope: &mut Scope) -> Result<Value, EvalError> {
        // && and || must control whether the right side runs at all
        if matches!(self.operator, Operator::And | Operator::Or) {
            return self.evaluate_logical(scope);
        }
        let left = self.left.evaluate(scope)?;
        let right = self.right.evaluate(scope)?;
        match self.operator {
            Operator::Add => eval_add(&left, &right),
            Operator::Subtract | Operator::Multiply | Operator::Divide | Operator::Remainder => {
                eval_arithmetic(self.operator, &left, &right)
            }
            Operator::ShiftLeft | Operator::ShiftRight => eval_shift(self.operator, &left, &right),
            Operator::BitAnd | Operator::BitXor | Operator::BitOr => {
                eval_bitwise(self.operator, &left, &right)
            }
            Operator::Less | Operator::Greater | Operator::LessEqual | Operator::GreaterEqual => {
                eval_compare(self.operator, &left, &right)
            }
            Operator::Equal => Ok(Value::Boolean(eval_equal(&left, &right))),
            Operator::NotEqual => Ok(Value::Boolean(!eval_equal(&left, &right))),
            Operator::And | Operator::Or => unreachable!("handled above"),
        }
    }
}

impl Operation {
    fn evaluate_logical(&self, scope: &mut Scope) -> Result<Value, EvalError> {
        let l = match self.left.evaluate(scope)? {
            Value::Boolean(l) => l,
            other => return Err(boolean_mismatch(self.operator, &other)),
        };
        // Short-circuit: the right side is only evaluated (and only
        // type-checked) when the left side does not decide the result.
        match (self.operator, l) {
            (Operator::And, false) => return Ok(Value::Boolean(false)),
            (Operator::Or, true) => return Ok(Value::Boolean(true)),
            _ => {}
        }
        let right = self.right.evaluate(scope)?;
        match right {
            Value::Boolean(r) => Ok(Value::Boolean(r)),
            other => Err(boolean_mismatch(self.operator, &other)),
        }
    }
}

fn boolean_mismatch(operator: Operator, found: &Value) -> EvalError {
    EvalError::TypeMismatch(format!(
        "operator '{}' requires boolean operands, found {}",
        operator.symbol(),
        found.kind()
    ))
}

/// Both operands promoted to a common numeric tier, or a TypeMismatch
/// naming the operator and the offending kinds.
fn numeric_pair(operator: Operator, left: &Value, right: &Value) -> Result<Promoted, EvalError> {
    match (left.number(), right.number()) {
        (Some(l), Some(r)) => Ok(promote(l, r)),
        _ => Err(EvalError::TypeMismatch(format!(
            "operator '{}' requires numeric operands, found {} and {}",
            operator.symbol(),
            left.kind(),
            right.kind()
        ))),
    }
}

fn overflow(operator: Operator) -> EvalError {
    EvalError::Arithmetic(format!("overflow in operator '{}'", operator.symbol()))
}

/// `+` is a total override for strings: either operand being text turns the
/// operation into concatenation of both display forms, numeric or not.
fn eval_add(left: &Value, right: &Value) -> Result<Value, EvalError> {
    if matches!(left, Value::Text(_)) || matches!(right, Value::Text(_)) {
        return Ok(Value::Text(format!("{}{}", left, right)));
    }
    match numeric_pair(Operator::Add, left, right)? {
        Promoted::Integer(a, b) => a.checked_add(b).map(Value::Integer).ok_or_else(|| overflow(Operator::Add)),
        Promoted::Exact(a, b) => a.checked_add(b).map(Value::Exact).ok_or_else(|| overflow(Operator::Add)),
        Promoted::Float(a, b) => Ok(Value::Float(a + b)),
    }
}

fn eval_arithmetic(operator: Operator, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let divide_like = matches!(operator, Operator::Divide | Operator::Remainder);
    match numeric_pair(operator, left, right)? {
        Promoted::Integer(a, b) => {
            if divide_like && b == 0 {
                return Err(EvalError::Arithmetic(format!(
                    "division by zero in operator '{}'",
                    operator.symbol()
                )));
            }
            let result = match operator {
                Operator::Subtract => a.checked_sub(b),
                Operator::Multiply => a.checked_mul(b),
                Operator::Divide => a.checked_div(b),
                Operator::Remainder => a.checked_rem(b),
                _ => unreachable!("arithmetic operator"),
            };
            result.map(Value::Integer).ok_or_else(|| overflow(operator))
        }
        Promoted::Exact(a, b) => {
            if divide_like && b.is_zero() {
                return Err(EvalError::Arithmetic(format!(
                    "division by zero in operator '{}'",
                    operator.symbol()
                )));
            }
            let result = match operator {
                Operator::Subtract => a.checked_sub(b),
                Operator::Multiply => a.checked_mul(b),
                Operator::Divide => a.checked_div(b),
                Operator::Remainder => a.checked_rem(b),
                _ => unreachable!("arithmetic operator"),
            };
            result.map(Value::Exact).ok_or_else(|| overflow(operator))
        }
        // IEEE semantics: float division by zero is an infinity, not an error
        Promoted::Float(a, b) => Ok(Value::Float(match operator {
            Operator::Subtract => a - b,
            Operator::Multiply => a * b,
            Operator::Divide => a / b,
            Operator::Remainder => a % b,
            _ => unreachable!("arithmetic operator"),
        })),
    }
}

fn eval_shift(operator: Operator, left: &Value, right: &Value) -> Result<Value, EvalError> {
    // The shift amount must be a plain integer, not a float or exact that
    // happens to be integral.
    let Value::Integer(amount) = right else {
        return Err(EvalError::TypeMismatch(format!(
            "operator '{}' requires a plain integer shift amount, found {}",
            operator.symbol(),
            right.kind()
        )));
    };
    let base = left
        .number()
        .and_then(|n| n.to_integer())
        .ok_or_else(|| {
            EvalError::TypeMismatch(format!(
                "operator '{}' requires an integral left operand, found {}",
                operator.symbol(),
                left.kind()
            ))
        })?;
    let amount = u32::try_from(*amount).map_err(|_| {
        EvalError::Arithmetic(format!("negative shift amount in operator '{}'", operator.symbol()))
    })?;
    let result = match operator {
        Operator::ShiftLeft => base.checked_shl(amount),
        Operator::ShiftRight => base.checked_shr(amount),
        _ => unreachable!("shift operator"),
    };
    result.map(Value::Integer).ok_or_else(|| {
        EvalError::Arithmetic(format!("shift amount out of range in operator '{}'", operator.symbol()))
    })
}

fn eval_bitwise(operator: Operator, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let mismatch = |found: &Value| {
        EvalError::TypeMismatch(format!(
            "operator '{}' requires integral operands, found {}",
            operator.symbol(),
            found.kind()
        ))
    };
    let a = left.number().and_then(|n| n.to_integer()).ok_or_else(|| mismatch(left))?;
    let b = right.number().and_then(|n| n.to_integer()).ok_or_else(|| mismatch(right))?;
    Ok(Value::Integer(match operator {
        Operator::BitAnd => a & b,
        Operator::BitXor => a ^ b,
        Operator::BitOr => a | b,
        _ => unreachable!("bitwise operator"),
    }))
}

fn eval_compare(operator: Operator, left: &Value, right: &Value) -> Result<Value, EvalError> {
    // Two texts compare lexicographically; everything else numerically
    if let (Value::Text(l), Value::Text(r)) = (left, right) {
        return Ok(Value::Boolean(match operator {
            Operator::Less => l < r,
            Operator::Greater => l > r,
            Operator::LessEqual => l <= r,
            Operator::GreaterEqual => l >= r,
            _ => unreachable!("comparison operator"),
        }));
    }
    let result = match numeric_pair(operator, left, right)? {
        Promoted::Integer(a, b) => compare(operator, &a, &b),
        Promoted::Exact(a, b) => compare(operator, &a, &b),
        Promoted::Float(a, b) => compare(operator, &a, &b),
    };
    Ok(Value::Boolean(result))
}

fn compare<T: PartialOrd>(operator: Operator, a: &T, b: &T) -> bool {
    match operator {
        Operator::Less => a < b,
        Operator::Greater => a > b,
        Operator::LessEqual => a <= b,
        Operator::GreaterEqual => a >= b,
        _ => unreachable!("comparison operator"),
    }
}

/// Equality with the undefined special case: an undefined left operand
/// tests only whether the right side is also undefined, never invoking
/// value equality on the absent value.
fn eval_equal(left: &Value, right: &Value) -> bool {
    if matches!(left, Value::Undefined) {
        return matches!(right, Value::Undefined);
    }
    left.equals(right)
}
