//! FILENAME: interpreter/src/tests.rs
//! PURPOSE: Consolidated unit tests for the interpreter crate.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::engine::Interpreter;
use crate::error::InterpretError;
use crate::process::{Constant, Process};
use crate::reader::Reader;
use crate::syntax::{Syntax, PRIORITY_ATOM};
use runtime::{EvalError, Scope, Value, ValueKind};

fn eval(source: &str) -> Value {
    crate::evaluate(source).unwrap()
}

fn eval_err(source: &str) -> InterpretError {
    crate::evaluate(source).unwrap_err()
}

fn exact(text: &str) -> Value {
    Value::Exact(Decimal::from_str(text).unwrap())
}

// ========================================
// READER SCAN TESTS
// ========================================

#[test]
fn scan_name_accepts_identifiers() {
    let reader = Reader::new("total_2 rest");
    let scan = reader.scan_name().unwrap();
    assert_eq!(scan.text, "total_2");
    assert_eq!(scan.end, 7);
}

#[test]
fn scan_name_rejects_digit_start() {
    assert!(Reader::new("2x").scan_name().is_none());
}

#[test]
fn scan_number_handles_literal_shapes() {
    for (source, expected) in [
        ("42", "42"),
        ("1.5", "1.5"),
        ("-2", "-2"),
        ("+7", "+7"),
        (".5", ".5"),
        ("1e3", "1e3"),
        ("2.5E-10", "2.5E-10"),
        ("0x1F", "0x1F"),
        ("0b101", "0b101"),
    ] {
        let scan = Reader::new(source).scan_number().unwrap();
        assert_eq!(scan.text, expected, "scanning {:?}", source);
    }
}

#[test]
fn scan_number_stops_before_trailing_dot() {
    // "1." is the integer 1; the dot is not part of the numeral
    let scan = Reader::new("1.x").scan_number().unwrap();
    assert_eq!(scan.text, "1");
}

#[test]
fn scan_number_rejects_sign_alone() {
    assert!(Reader::new("+").scan_number().is_none());
    assert!(Reader::new("- 1").scan_number().is_none());
}

#[test]
fn scan_operator_takes_longest_match() {
    for (source, expected) in [("<<2", "<<"), ("<=2", "<="), ("<2", "<"), ("==2", "=="), ("=2", "="), ("&&x", "&&"), ("&x", "&")] {
        let scan = Reader::new(source).scan_operator().unwrap();
        assert_eq!(scan.text, expected, "scanning {:?}", source);
    }
}

#[test]
fn scans_never_move_the_reader() {
    let reader = Reader::new("abc");
    reader.scan_name().unwrap();
    assert_eq!(reader.position(), 0);
}

#[test]
fn eat_operator_consumes_only_exact_tokens() {
    let mut reader = Reader::new("<<2");
    assert!(!reader.eat_operator("<"));
    assert_eq!(reader.position(), 0);
    assert!(reader.eat_operator("<<"));
    assert_eq!(reader.position(), 2);
}

#[test]
fn repeated_scans_hit_the_token_cache() {
    let reader = Reader::new("counter");
    let first = reader.scan_name().unwrap();
    let second = reader.scan_name().unwrap();
    assert_eq!(first, second);
}

// ========================================
// LITERAL KIND SELECTION TESTS
// ========================================

#[test]
fn literal_kind_selection() {
    assert_eq!(eval("42"), Value::Integer(42));
    assert_eq!(eval("42").kind(), ValueKind::Integer);
    assert_eq!(eval("1.5").kind(), ValueKind::Exact);
    assert_eq!(eval("1e3").kind(), ValueKind::Float);
    assert_eq!(eval("2.5E-1").kind(), ValueKind::Float);
    assert_eq!(eval("0x1F"), Value::Integer(31));
    assert_eq!(eval("0b101"), Value::Integer(5));
}

#[test]
fn integer_literals_round_trip() {
    for n in [0i64, 1, -1, 7, 42, 1_000_000, 999_999_999_999_999_999] {
        assert_eq!(eval(&n.to_string()), Value::Integer(n));
    }
}

#[test]
fn oversized_integral_literals_fall_back_to_float() {
    // 19 digits exceeds the integer threshold
    let value = eval("1234567890123456789");
    assert_eq!(value.kind(), ValueKind::Float);
}

#[test]
fn long_fraction_literals_fall_back_to_float() {
    let value = eval("1.00000000000000000000000000000001");
    assert_eq!(value.kind(), ValueKind::Float);
}

#[test]
fn string_literals_support_escapes() {
    assert_eq!(eval("\"hi\""), Value::Text("hi".to_string()));
    assert_eq!(eval(r#""a\nb""#), Value::Text("a\nb".to_string()));
    assert_eq!(eval(r#""say \"hi\"""#), Value::Text("say \"hi\"".to_string()));
    assert_eq!(eval("\"\""), Value::Text(String::new()));
}

#[test]
fn unterminated_string_is_a_syntax_error() {
    assert!(matches!(eval_err("\"open"), InterpretError::Syntax(_)));
}

#[test]
fn boolean_keywords_evaluate() {
    assert_eq!(eval("true"), Value::Boolean(true));
    assert_eq!(eval("false"), Value::Boolean(false));
}

#[test]
fn keyword_prefix_names_stay_names() {
    // "truex" is a bare name, not the keyword plus an x
    assert_eq!(eval("truex"), Value::Undefined);
}

// ========================================
// PRECEDENCE AND ASSOCIATIVITY TESTS
// ========================================

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(eval("1+2*3"), Value::Integer(7));
    assert_eq!(eval("2*3+4*5"), Value::Integer(26));
}

#[test]
fn brackets_override_precedence() {
    assert_eq!(eval("(1+2)*3"), Value::Integer(9));
}

#[test]
fn subtraction_is_left_associative() {
    assert_eq!(eval("10-3-2"), Value::Integer(5));
}

#[test]
fn division_is_left_associative() {
    assert_eq!(eval("100/5/2"), Value::Integer(10));
}

#[test]
fn addition_binds_tighter_than_shifts() {
    assert_eq!(eval("1+2<<1"), Value::Integer(6));
}

#[test]
fn comparison_is_looser_than_arithmetic() {
    assert_eq!(eval("1+2 == 3"), Value::Boolean(true));
    assert_eq!(eval("2*3 < 7"), Value::Boolean(true));
}

#[test]
fn logical_operators_are_loosest() {
    assert_eq!(eval("1 < 2 && 2 < 3"), Value::Boolean(true));
    assert_eq!(eval("1 > 2 || 2 > 1"), Value::Boolean(true));
}

#[test]
fn signed_literals_inside_expressions() {
    assert_eq!(eval("-5 + 3"), Value::Integer(-2));
    assert_eq!(eval("2 * -3"), Value::Integer(-6));
}

#[test]
fn whitespace_is_insignificant() {
    assert_eq!(eval("  1  +\n\t2  "), Value::Integer(3));
}

// ========================================
// OPERATOR SEMANTICS TESTS
// ========================================

#[test]
fn integer_arithmetic_stays_integral() {
    assert_eq!(eval("7/2"), Value::Integer(3));
    assert_eq!(eval("7%3"), Value::Integer(1));
}

#[test]
fn exact_arithmetic_keeps_precision() {
    assert_eq!(eval("0.1 + 0.2"), exact("0.3"));
    assert_eq!(eval("0.1 + 0.2").kind(), ValueKind::Exact);
    assert_eq!(eval("1.5 * 2"), exact("3.0"));
}

#[test]
fn float_operand_promotes_the_whole_operation() {
    assert_eq!(eval("1e2 + 1").kind(), ValueKind::Float);
    assert_eq!(eval("1e2 + 1"), Value::Float(101.0));
    assert_eq!(eval("1.5 + 1e0").kind(), ValueKind::Float);
}

#[test]
fn shifts_and_bitwise() {
    assert_eq!(eval("1 << 4"), Value::Integer(16));
    assert_eq!(eval("16 >> 2"), Value::Integer(4));
    assert_eq!(eval("6 & 3"), Value::Integer(2));
    assert_eq!(eval("6 | 3"), Value::Integer(7));
    assert_eq!(eval("6 ^ 3"), Value::Integer(5));
}

#[test]
fn shift_left_operand_needs_only_an_integral_reading() {
    // 6.0 is an exact value, but it reads as an integer
    assert_eq!(eval("6.0 << 1"), Value::Integer(12));
}

#[test]
fn shift_amount_must_be_a_plain_integer() {
    assert!(matches!(
        eval_err("1 << 1.5"),
        InterpretError::Eval(EvalError::TypeMismatch(_))
    ));
    assert!(matches!(
        eval_err("1 << 2.0"),
        InterpretError::Eval(EvalError::TypeMismatch(_))
    ));
}

#[test]
fn fractional_operands_fail_bitwise_operators() {
    assert!(matches!(
        eval_err("6.5 & 1"),
        InterpretError::Eval(EvalError::TypeMismatch(_))
    ));
}

#[test]
fn division_by_zero_is_an_arithmetic_error() {
    assert!(matches!(
        eval_err("1/0"),
        InterpretError::Eval(EvalError::Arithmetic(_))
    ));
    assert!(matches!(
        eval_err("1.5/0"),
        InterpretError::Eval(EvalError::Arithmetic(_))
    ));
    assert!(matches!(
        eval_err("7%0"),
        InterpretError::Eval(EvalError::Arithmetic(_))
    ));
}

#[test]
fn string_concatenation_dominates_addition() {
    assert_eq!(eval("\"a\"+1"), Value::Text("a1".to_string()));
    assert_eq!(eval("1+\"a\""), Value::Text("1a".to_string()));
    assert_eq!(eval("\"n=\"+1.5"), Value::Text("n=1.5".to_string()));
    assert_eq!(eval("\"a\"+\"b\""), Value::Text("ab".to_string()));
}

#[test]
fn undefined_concatenates_as_its_display_text() {
    assert_eq!(eval("\"\" + missing"), Value::Text("undefined".to_string()));
}

#[test]
fn text_comparison_is_lexicographic() {
    assert_eq!(eval("\"apple\" < \"banana\""), Value::Boolean(true));
    assert_eq!(eval("\"b\" >= \"b\""), Value::Boolean(true));
}

#[test]
fn equality_promotes_numeric_tiers() {
    assert_eq!(eval("1 == 1.0"), Value::Boolean(true));
    assert_eq!(eval("1 != 2"), Value::Boolean(true));
    assert_eq!(eval("\"1\" == 1"), Value::Boolean(false));
}

#[test]
fn undefined_equality_tests_absence() {
    assert_eq!(eval("missing == alsomissing"), Value::Boolean(true));
    assert_eq!(eval("missing == 1"), Value::Boolean(false));
    assert_eq!(eval("missing != 1"), Value::Boolean(true));
}

#[test]
fn logical_operators_short_circuit() {
    assert_eq!(eval("false && (1/0)"), Value::Boolean(false));
    assert_eq!(eval("true || (1/0)"), Value::Boolean(true));
    assert_eq!(eval("true && true"), Value::Boolean(true));
    assert_eq!(eval("false || false"), Value::Boolean(false));
}

#[test]
fn logical_operators_require_booleans() {
    assert!(matches!(
        eval_err("1 && true"),
        InterpretError::Eval(EvalError::TypeMismatch(_))
    ));
    assert!(matches!(
        eval_err("true && 1"),
        InterpretError::Eval(EvalError::TypeMismatch(_))
    ));
}

#[test]
fn undefined_operand_in_arithmetic_is_a_type_mismatch() {
    assert!(matches!(
        eval_err("missing * 3"),
        InterpretError::Eval(EvalError::TypeMismatch(_))
    ));
}

#[test]
fn boolean_operand_in_arithmetic_is_a_type_mismatch() {
    assert!(matches!(
        eval_err("true + 1"),
        InterpretError::Eval(EvalError::TypeMismatch(_))
    ));
}

#[test]
fn integer_overflow_is_an_arithmetic_error() {
    assert!(matches!(
        eval_err("999999999999999999 * 999999999999999999"),
        InterpretError::Eval(EvalError::Arithmetic(_))
    ));
}

// ========================================
// VARIABLE DECLARATION TESTS
// ========================================

#[test]
fn declarations_bind_in_order_and_yield_the_last_value() {
    assert_eq!(eval("var x=1,y=x+1; y"), Value::Integer(2));
    assert_eq!(eval("var a=2, b=a*a, c=b+a"), Value::Integer(6));
}

#[test]
fn declaration_without_initializer_yields_undefined() {
    assert_eq!(eval("var x"), Value::Undefined);
}

#[test]
fn redeclaration_overwrites() {
    assert_eq!(eval("var x=1; var x=2; x"), Value::Integer(2));
}

#[test]
fn failed_declaration_keeps_earlier_bindings() {
    let program = crate::interpret("var a=1, b=1/0").unwrap();
    let mut scope = Scope::new();
    assert!(program.evaluate(&mut scope).is_err());
    assert_eq!(scope.lookup("a"), Some(&Value::Integer(1)));
    assert!(scope.lookup("b").is_none());
}

#[test]
fn var_prefix_names_are_plain_references() {
    // "variable" must not trigger the declaration rule
    assert_eq!(eval("var variable = 7; variable"), Value::Integer(7));
}

// ========================================
// FUNCTION CALL TESTS
// ========================================

fn scope_with_double() -> Scope {
    let mut scope = Scope::new();
    scope.define(
        "double",
        Value::function("double", |args| match args {
            [value] => match value.number() {
                Some(n) => Ok(Value::Float(n.to_f64() * 2.0)),
                None => Err(EvalError::InvalidCall("double expects a number".to_string())),
            },
            _ => Err(EvalError::InvalidCall("double expects one argument".to_string())),
        }),
    );
    scope
}

#[test]
fn calls_resolve_through_the_scope() {
    let program = crate::interpret("double(21)").unwrap();
    let mut scope = scope_with_double();
    assert_eq!(program.evaluate(&mut scope), Ok(Value::Float(42.0)));
}

#[test]
fn call_arguments_are_full_expressions() {
    let program = crate::interpret("double(1+2) + 1").unwrap();
    let mut scope = scope_with_double();
    assert_eq!(program.evaluate(&mut scope), Ok(Value::Float(7.0)));
}

#[test]
fn calls_nest() {
    let program = crate::interpret("double(double(10))").unwrap();
    let mut scope = scope_with_double();
    assert_eq!(program.evaluate(&mut scope), Ok(Value::Float(40.0)));
}

#[test]
fn zero_argument_calls_parse() {
    let program = crate::interpret("answer()").unwrap();
    let mut scope = Scope::new();
    scope.define("answer", Value::function("answer", |_| Ok(Value::Integer(42))));
    assert_eq!(program.evaluate(&mut scope), Ok(Value::Integer(42)));
}

#[test]
fn calling_an_undefined_name_is_an_invalid_call() {
    assert!(matches!(
        eval_err("missing(1)"),
        InterpretError::Eval(EvalError::InvalidCall(_))
    ));
}

#[test]
fn calling_a_non_function_is_an_invalid_call() {
    assert!(matches!(
        eval_err("var f=1; f(2)"),
        InterpretError::Eval(EvalError::InvalidCall(_))
    ));
}

#[test]
fn argument_rejection_surfaces_the_callables_error() {
    let program = crate::interpret("double(true)").unwrap();
    let mut scope = scope_with_double();
    assert_eq!(
        program.evaluate(&mut scope),
        Err(EvalError::InvalidCall("double expects a number".to_string()))
    );
}

// ========================================
// DRIVER TESTS
// ========================================

#[test]
fn program_returns_the_last_units_value() {
    assert_eq!(eval("1; 2; 3"), Value::Integer(3));
}

#[test]
fn separators_and_padding_are_skipped() {
    assert_eq!(eval(";;1;;"), Value::Integer(1));
    assert_eq!(eval("1 2"), Value::Integer(2));
}

#[test]
fn empty_program_evaluates_to_undefined() {
    assert_eq!(eval(""), Value::Undefined);
    assert_eq!(eval(" ;; "), Value::Undefined);
}

#[test]
fn unparseable_input_is_a_syntax_error() {
    // "1" parses as a unit; the dangling "+ @" does not
    let InterpretError::Syntax(err) = eval_err("1 + @") else {
        panic!("expected a syntax error");
    };
    assert_eq!(err.position, 2);
    assert_eq!(err.fragment, "+ @");
}

#[test]
fn bare_garbage_is_a_syntax_error() {
    assert!(matches!(eval_err("@"), InterpretError::Syntax(_)));
    assert!(matches!(eval_err("1 )"), InterpretError::Syntax(_)));
}

// ========================================
// CACHING AND IDEMPOTENCE TESTS
// ========================================

#[test]
fn equal_text_shares_one_reader_cache() {
    let engine = Interpreter::new();
    let first = engine.reader_cache("1+2");
    let second = engine.reader_cache("1+2");
    let other = engine.reader_cache("1+3");
    assert!(Arc::ptr_eq(&first, &second));
    assert!(!Arc::ptr_eq(&first, &other));
}

#[test]
fn reparsing_equal_text_reuses_the_position_cache() {
    let engine = Interpreter::new();
    let first = engine.interpret_program("1+2*3").unwrap();
    let populated = engine.reader_cache("1+2*3").cached_positions();
    assert!(populated > 0);

    let second = engine.interpret_program("1+2*3").unwrap();
    assert_eq!(engine.reader_cache("1+2*3").cached_positions(), populated);
    assert_eq!(first.evaluate_new(), second.evaluate_new());
}

#[test]
fn independent_parses_evaluate_identically() {
    let a = crate::evaluate("(1+2)*3").unwrap();
    let b = crate::evaluate("(1+2)*3").unwrap();
    assert_eq!(a, b);
}

#[test]
fn programs_are_pure_functions_of_the_scope() {
    let program = crate::interpret("x * 2").unwrap();
    let mut first = Scope::new();
    first.define("x", Value::Integer(3));
    let mut second = Scope::new();
    second.define("x", Value::Integer(3));
    assert_eq!(program.evaluate(&mut first), program.evaluate(&mut second));
    assert_eq!(program.evaluate(&mut first), Ok(Value::Integer(6)));
}

#[test]
fn failed_evaluation_leaves_parse_state_usable() {
    let engine = Interpreter::new();
    let program = engine.interpret_program("1/0").unwrap();
    assert!(program.evaluate_new().is_err());
    let again = engine.interpret_program("1/0").unwrap();
    assert!(again.evaluate_new().is_err());
    assert_eq!(engine.interpret_program("1+1").unwrap().evaluate_new(), Ok(Value::Integer(2)));
}

// ========================================
// EXTENSION POINT TESTS
// ========================================

/// A host rule: a one-character literal with a fixed value.
struct MarkerSyntax {
    marker: char,
    value: i64,
    priority: u32,
}

impl Syntax for MarkerSyntax {
    fn begin_chars(&self) -> Vec<char> {
        vec![self.marker]
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn try_interpret(
        &self,
        _engine: &Interpreter,
        reader: &mut Reader,
        _ceiling: u32,
    ) -> Option<Arc<dyn Process>> {
        reader
            .eat_char(self.marker)
            .then(|| Arc::new(Constant::new(Value::Integer(self.value))) as Arc<dyn Process>)
    }
}

#[test]
fn host_rules_participate_in_expressions() {
    let engine = Interpreter::with_rules(vec![Arc::new(MarkerSyntax {
        marker: '@',
        value: 42,
        priority: PRIORITY_ATOM,
    })]);
    let program = engine.interpret_program("1 + @").unwrap();
    assert_eq!(program.evaluate_new(), Ok(Value::Integer(43)));
    assert_eq!(engine.interpret_program("@").unwrap().evaluate_new(), Ok(Value::Integer(42)));
}

#[test]
fn equal_priority_ties_go_to_the_first_registered_rule() {
    // Enumerate both registration orders; the cache must agree with the
    // dispatch order each time.
    for (first_value, second_value, expected) in [(1, 2, 1), (2, 1, 2)] {
        let engine = Interpreter::with_rules(vec![
            Arc::new(MarkerSyntax { marker: '#', value: first_value, priority: PRIORITY_ATOM }),
            Arc::new(MarkerSyntax { marker: '#', value: second_value, priority: PRIORITY_ATOM }),
        ]);
        let program = engine.interpret_program("#").unwrap();
        assert_eq!(program.evaluate_new(), Ok(Value::Integer(expected)));
        // A second parse adopts the committed entry and must not diverge
        let reparsed = engine.interpret_program("#").unwrap();
        assert_eq!(reparsed.evaluate_new(), Ok(Value::Integer(expected)));
    }
}
