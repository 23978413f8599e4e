//! FILENAME: interpreter/src/syntax.rs
//! PURPOSE: The grammar rule trait and the default rule library.
//! CONTEXT: The engine does no grammar work of its own; every production is
//! a rule registered under the characters that can begin it. Rules are
//! stateless recognizers: given the engine (for sub-expressions) and a
//! reader, they either produce an executable node or fail without consuming
//! input the engine cares about (the engine restores the reader afterwards).
//!
//! GRAMMAR (priorities in brackets; smaller binds tighter):
//!   program      --> unit (";"* unit)*
//!   unit         --> declaration | expression
//!   declaration  --> "var" binding ("," binding)*              [300]
//!   binding      --> name ("=" expression)?
//!   expression   --> operator tiers, loosest to tightest:
//!                    "||" [190]  "&&" [180]  "|" [170]  "^" [160]
//!                    "&" [150]   "==" "!=" [140]
//!                    "<" ">" "<=" ">=" [130]  "<<" ">>" [120]
//!                    "+" "-" [110]  "*" "/" "%" [100]
//!   call         --> name "(" (expression ("," expression)*)? ")"  [20]
//!   keyword      --> "true" | "false"                          [15]
//!   atom         --> "(" expression ")" | numeral | string | name  [10]

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use runtime::Value;

use crate::engine::Interpreter;
use crate::process::{Binding, Constant, Declaration, FieldRef, FunctionCall, Operation, Operator, Process};
use crate::reader::Reader;

// ========================================
// PRIORITY TIERS
// ========================================

/// Atoms: brackets, literals, bare names.
pub const PRIORITY_ATOM: u32 = 10;
/// Keyword literals (`true`, `false`); looser than a bare name so the exact
/// word is recognized before the name rule swallows it.
pub const PRIORITY_KEYWORD: u32 = 15;
/// Function invocation; looser than keywords and names so `f(x)` is tried
/// before `f` alone.
pub const PRIORITY_CALL: u32 = 20;
/// Variable declarations, the loosest production in the library.
pub const PRIORITY_DECLARATION: u32 = 300;
/// The ceiling the driver parses top-level units at.
pub const CEILING_LOOSEST: u32 = u32::MAX;
/// Call arguments parse just tighter than the declaration/separator tier.
pub const CEILING_ARGUMENT: u32 = PRIORITY_DECLARATION;

/// Integer literals keep at most this many digits; longer integral
/// numerals fall back to float.
const MAX_INTEGER_DIGITS: usize = 18;
/// Fractional literals within this many significant digits stay exact.
const MAX_EXACT_DIGITS: usize = 28;

/// A pluggable grammar rule.
///
/// Hosts may implement this to embed new operators or literal forms and
/// register them with [`Interpreter::with_rules`].
pub trait Syntax: Send + Sync {
    /// Every character a match can begin with; the engine dispatches on
    /// the first significant character at the current position.
    fn begin_chars(&self) -> Vec<char>;

    /// Binding tightness: numerically smaller is tighter. Candidates are
    /// attempted loosest-first, and only below the requested ceiling.
    fn priority(&self) -> u32;

    /// Whether a successful match should be retried at the same start
    /// position to extend a left-associative chain.
    fn is_continuation(&self) -> bool {
        false
    }

    /// Attempts to recognize this production at the reader's position.
    /// On success the reader rests just past the consumed input.
    fn try_interpret(
        &self,
        engine: &Interpreter,
        reader: &mut Reader,
        ceiling: u32,
    ) -> Option<Arc<dyn Process>>;
}

/// Every character an expression can begin with: operands of the binary
/// operator rules dispatch through these.
fn expression_start_chars() -> Vec<char> {
    let mut chars: Vec<char> = ('a'..='z').chain('A'..='Z').chain('0'..='9').collect();
    chars.extend(['_', '"', '(', '.', '+', '-']);
    chars
}

/// The closed default rule library, in registration order. Buckets are
/// sorted by priority afterwards; registration order only breaks ties.
pub(crate) fn default_rules() -> Vec<Arc<dyn Syntax>> {
    let mut rules: Vec<Arc<dyn Syntax>> = vec![
        Arc::new(BracketSyntax),
        Arc::new(NumberSyntax),
        Arc::new(StringSyntax),
        Arc::new(KeywordSyntax::new("true", Value::Boolean(true))),
        Arc::new(KeywordSyntax::new("false", Value::Boolean(false))),
        Arc::new(FieldSyntax),
        Arc::new(CallSyntax),
        Arc::new(DeclarationSyntax),
    ];
    let operators: &[(&str, u32, Operator)] = &[
        ("*", 100, Operator::Multiply),
        ("/", 100, Operator::Divide),
        ("%", 100, Operator::Remainder),
        ("+", 110, Operator::Add),
        ("-", 110, Operator::Subtract),
        ("<<", 120, Operator::ShiftLeft),
        (">>", 120, Operator::ShiftRight),
        ("<", 130, Operator::Less),
        (">", 130, Operator::Greater),
        ("<=", 130, Operator::LessEqual),
        (">=", 130, Operator::GreaterEqual),
        ("==", 140, Operator::Equal),
        ("!=", 140, Operator::NotEqual),
        ("&", 150, Operator::BitAnd),
        ("^", 160, Operator::BitXor),
        ("|", 170, Operator::BitOr),
        ("&&", 180, Operator::And),
        ("||", 190, Operator::Or),
    ];
    for &(token, priority, operator) in operators {
        rules.push(Arc::new(OperatorSyntax { token, priority, operator }));
    }
    rules
}

// ========================================
// ATOMS
// ========================================

/// `( expression )` — yields the inner node unchanged, so brackets only
/// reset the precedence context.
struct BracketSyntax;

impl Syntax for BracketSyntax {
    fn begin_chars(&self) -> Vec<char> {
        vec!['(']
    }

    fn priority(&self) -> u32 {
        PRIORITY_ATOM
    }

    fn try_interpret(
        &self,
        engine: &Interpreter,
        reader: &mut Reader,
        _ceiling: u32,
    ) -> Option<Arc<dyn Process>> {
        if !reader.eat_char('(') {
            return None;
        }
        let inner = engine.interpret(reader, CEILING_LOOSEST)?;
        reader.eat_char(')').then_some(inner)
    }
}

/// A numeric literal. The scan is maximal; kind selection follows the
/// promote-to-the-smallest-sufficient policy:
/// radix prefix -> integer; exponent -> float; fraction within precision
/// -> exact, beyond -> float; integral within the digit threshold ->
/// integer, beyond -> float.
struct NumberSyntax;

impl Syntax for NumberSyntax {
    fn begin_chars(&self) -> Vec<char> {
        let mut chars: Vec<char> = ('0'..='9').collect();
        chars.extend(['.', '+', '-']);
        chars
    }

    fn priority(&self) -> u32 {
        PRIORITY_ATOM
    }

    fn try_interpret(
        &self,
        _engine: &Interpreter,
        reader: &mut Reader,
        _ceiling: u32,
    ) -> Option<Arc<dyn Process>> {
        reader.skip_whitespace();
        let scan = reader.scan_number()?;
        let value = classify_numeral(&scan.text)?;
        reader.set_position(scan.end);
        Some(Arc::new(Constant::new(value)))
    }
}

fn classify_numeral(text: &str) -> Option<Value> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    // Radix-prefixed integers
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0b", 2), ("0B", 2)] {
        if let Some(body) = digits.strip_prefix(prefix) {
            let magnitude = i64::from_str_radix(body, radix).ok()?;
            return Some(Value::Integer(if negative { -magnitude } else { magnitude }));
        }
    }

    if text.contains(['e', 'E']) {
        return text.parse::<f64>().ok().map(Value::Float);
    }

    let digit_count = text.chars().filter(char::is_ascii_digit).count();
    if text.contains('.') {
        if digit_count <= MAX_EXACT_DIGITS {
            if let Ok(decimal) = Decimal::from_str(text) {
                return Some(Value::Exact(decimal));
            }
        }
        text.parse::<f64>().ok().map(Value::Float)
    } else if digit_count <= MAX_INTEGER_DIGITS {
        text.parse::<i64>().ok().map(Value::Integer)
    } else {
        text.parse::<f64>().ok().map(Value::Float)
    }
}

/// A `"`-quoted string literal with backslash escapes. An unterminated
/// literal fails the rule (and therefore the parse).
struct StringSyntax;

impl Syntax for StringSyntax {
    fn begin_chars(&self) -> Vec<char> {
        vec!['"']
    }

    fn priority(&self) -> u32 {
        PRIORITY_ATOM
    }

    fn try_interpret(
        &self,
        _engine: &Interpreter,
        reader: &mut Reader,
        _ceiling: u32,
    ) -> Option<Arc<dyn Process>> {
        if !reader.eat_char('"') {
            return None;
        }
        let mut text = String::new();
        loop {
            let ch = reader.peek()?;
            reader.set_position(reader.position() + ch.len_utf8());
            match ch {
                '"' => break,
                '\\' => {
                    let escaped = reader.peek()?;
                    reader.set_position(reader.position() + escaped.len_utf8());
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                }
                other => text.push(other),
            }
        }
        Some(Arc::new(Constant::new(Value::Text(text))))
    }
}

/// An exact keyword that evaluates to a fixed value (`true`, `false`).
/// Any longer identifier falls through to the bare-name rule.
struct KeywordSyntax {
    word: &'static str,
    value: Value,
}

impl KeywordSyntax {
    fn new(word: &'static str, value: Value) -> KeywordSyntax {
        KeywordSyntax { word, value }
    }
}

impl Syntax for KeywordSyntax {
    fn begin_chars(&self) -> Vec<char> {
        self.word.chars().take(1).collect()
    }

    fn priority(&self) -> u32 {
        PRIORITY_KEYWORD
    }

    fn try_interpret(
        &self,
        _engine: &Interpreter,
        reader: &mut Reader,
        _ceiling: u32,
    ) -> Option<Arc<dyn Process>> {
        reader.skip_whitespace();
        let scan = reader.scan_name()?;
        if scan.text != self.word {
            return None;
        }
        reader.set_position(scan.end);
        Some(Arc::new(Constant::new(self.value.clone())))
    }
}

/// A bare name; resolves against the scope at evaluation time, yielding
/// the undefined value for unknown names.
struct FieldSyntax;

impl Syntax for FieldSyntax {
    fn begin_chars(&self) -> Vec<char> {
        name_start_chars()
    }

    fn priority(&self) -> u32 {
        PRIORITY_ATOM
    }

    fn try_interpret(
        &self,
        _engine: &Interpreter,
        reader: &mut Reader,
        _ceiling: u32,
    ) -> Option<Arc<dyn Process>> {
        reader.skip_whitespace();
        let scan = reader.scan_name()?;
        reader.set_position(scan.end);
        Some(Arc::new(FieldRef::new(scan.text)))
    }
}

fn name_start_chars() -> Vec<char> {
    let mut chars: Vec<char> = ('a'..='z').chain('A'..='Z').collect();
    chars.push('_');
    chars
}

// ========================================
// CALLS AND DECLARATIONS
// ========================================

/// `name ( argument, ... )` — arguments are full expressions parsed just
/// tighter than the separator tier.
struct CallSyntax;

impl Syntax for CallSyntax {
    fn begin_chars(&self) -> Vec<char> {
        name_start_chars()
    }

    fn priority(&self) -> u32 {
        PRIORITY_CALL
    }

    fn try_interpret(
        &self,
        engine: &Interpreter,
        reader: &mut Reader,
        _ceiling: u32,
    ) -> Option<Arc<dyn Process>> {
        reader.skip_whitespace();
        let name = reader.scan_name()?;
        reader.set_position(name.end);
        if !reader.eat_char('(') {
            return None;
        }
        let mut arguments = Vec::new();
        if !reader.eat_char(')') {
            loop {
                let argument = engine.interpret(reader, CEILING_ARGUMENT)?;
                arguments.push(argument);
                if reader.eat_char(',') {
                    continue;
                }
                if reader.eat_char(')') {
                    break;
                }
                return None;
            }
        }
        Some(Arc::new(FunctionCall::new(name.text, arguments)))
    }
}

/// `var name (= expression)? (, name (= expression)?)*`
struct DeclarationSyntax;

impl Syntax for DeclarationSyntax {
    fn begin_chars(&self) -> Vec<char> {
        vec!['v']
    }

    fn priority(&self) -> u32 {
        PRIORITY_DECLARATION
    }

    fn try_interpret(
        &self,
        engine: &Interpreter,
        reader: &mut Reader,
        _ceiling: u32,
    ) -> Option<Arc<dyn Process>> {
        reader.skip_whitespace();
        let keyword = reader.scan_name()?;
        if keyword.text != "var" {
            return None;
        }
        reader.set_position(keyword.end);
        let mut bindings = Vec::new();
        loop {
            reader.skip_whitespace();
            let name = reader.scan_name()?;
            reader.set_position(name.end);
            let initializer = if reader.eat_operator("=") {
                Some(engine.interpret(reader, PRIORITY_DECLARATION)?)
            } else {
                None
            };
            bindings.push(Binding {
                name: name.text,
                initializer,
            });
            if !reader.eat_char(',') {
                break;
            }
        }
        Some(Arc::new(Declaration::new(bindings)))
    }
}

// ========================================
// BINARY OPERATORS
// ========================================

/// The shared template for all seventeen binary operators: left operand at
/// the rule's own priority (which is what lets the continuation mechanism
/// re-adopt the rule's previous result and extend the chain), the literal
/// operator token, then the right operand at the same priority.
struct OperatorSyntax {
    token: &'static str,
    priority: u32,
    operator: Operator,
}

impl Syntax for OperatorSyntax {
    fn begin_chars(&self) -> Vec<char> {
        expression_start_chars()
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn is_continuation(&self) -> bool {
        true
    }

    fn try_interpret(
        &self,
        engine: &Interpreter,
        reader: &mut Reader,
        _ceiling: u32,
    ) -> Option<Arc<dyn Process>> {
        let left = engine.interpret(reader, self.priority)?;
        if !reader.eat_operator(self.token) {
            return None;
        }
        let right = engine.interpret(reader, self.priority)?;
        Some(Arc::new(Operation::new(self.operator, left, right)))
    }
}
