// tests/integration_tests.rs

use pretty_assertions::assert_eq;
use rule_dsl::{
    Diagnostic, DiagnosticKind, Engine, EvalContext, FunctionRegistry, Position, Value, ValueKind,
};
use serde_json::json;

fn context() -> EvalContext {
    EvalContext::from_json(json!({
        "amount": 1500,
        "status": "pending",
        "tags": ["vip", "eu"],
        "email": "ann@example.com",
        "user": {"name": "Ann", "age": 34, "address": {"country": "DE"}},
        "items": [{"price": 10.5}, {"price": 4.5}],
        "nothing": null
    }))
    .expect("context is an object")
}

fn eval(source: &str) -> Value {
    rule_dsl::run(source, &context())
        .unwrap_or_else(|e| panic!("failed to evaluate {:?}: {}", source, e))
}

fn eval_err(source: &str) -> Diagnostic {
    match rule_dsl::run(source, &context()) {
        Ok(value) => panic!("expected {:?} to fail, got {:?}", source, value),
        Err(e) => e,
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_arithmetic() {
    assert_eq!(eval("amount * 2 - 1000"), Value::Number(2000.0));
    assert_eq!(eval("7 / 2"), Value::Number(3.5));
    assert_eq!(eval("-amount"), Value::Number(-1500.0));
}

#[test]
fn test_modulo_keeps_sign_of_dividend() {
    assert_eq!(eval("7 % 3"), Value::Number(1.0));
    assert_eq!(eval("-7 % 3"), Value::Number(-1.0));
    assert_eq!(eval("7.5 % 2"), Value::Number(1.5));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval("user.name + ' <' + email + '>'"), Value::from("Ann <ann@example.com>"));
}

#[test]
fn test_mixed_addition_is_a_type_mismatch() {
    let err = eval_err("1 + '1'");
    assert_eq!(
        err.message(),
        "type mismatch: `+` cannot be applied to number and string"
    );
    assert_eq!(err.position, Position::new(2, 1, 3));
}

#[test]
fn test_division_error_is_positioned_at_operator() {
    let err = eval_err("amount + (1 / 0)");
    assert_eq!(err.kind, DiagnosticKind::DivisionByZero);
    assert_eq!(err.position, Position::new(12, 1, 13));
}

// ============================================================================
// Comparison and Equality
// ============================================================================

#[test]
fn test_comparisons() {
    assert_eq!(eval("amount > 1000"), Value::Boolean(true));
    assert_eq!(eval("amount <= 1000"), Value::Boolean(false));
    assert_eq!(eval("'abc' < 'abd'"), Value::Boolean(true));
    assert_eq!(eval("'b' >= 'a'"), Value::Boolean(true));
}

#[test]
fn test_ordering_across_kinds_is_an_error() {
    let err = eval_err("amount < '2000'");
    assert_eq!(
        err.kind,
        DiagnosticKind::TypeMismatch {
            operation: "<".into(),
            operands: vec![ValueKind::Number, ValueKind::String],
        }
    );
}

#[test]
fn test_equality_is_structural_and_never_coerces() {
    assert_eq!(eval("1 == '1'"), Value::Boolean(false));
    assert_eq!(eval("nothing == null"), Value::Boolean(true));
    assert_eq!(eval("[1, 'a'] == [1, 'a']"), Value::Boolean(true));
    assert_eq!(eval("tags != ['vip']"), Value::Boolean(true));
    assert_eq!(eval("user.address == user.address"), Value::Boolean(true));
}

// ============================================================================
// Logic
// ============================================================================

#[test]
fn test_boolean_logic() {
    assert_eq!(
        eval("amount > 1000 and status == 'pending'"),
        Value::Boolean(true)
    );
    assert_eq!(eval("not (amount > 1000) or false"), Value::Boolean(false));
}

#[test]
fn test_logic_requires_booleans() {
    let left = eval_err("1 and true");
    assert_eq!(left.code(), "DSL_TYPE_MISMATCH");

    let right = eval_err("true and 1");
    assert_eq!(
        right.kind,
        DiagnosticKind::TypeMismatch {
            operation: "and".into(),
            operands: vec![ValueKind::Boolean, ValueKind::Number],
        }
    );

    let negated = eval_err("not amount");
    assert_eq!(
        negated.message(),
        "type mismatch: `not` cannot be applied to number"
    );
}

#[test]
fn test_conditional_requires_boolean_test() {
    let err = eval_err("if amount then 1 else 2");
    assert_eq!(err.position, Position::new(3, 1, 4));
    assert_eq!(err.code(), "DSL_TYPE_MISMATCH");
}

// ============================================================================
// Records and Lists
// ============================================================================

#[test]
fn test_member_access() {
    assert_eq!(eval("user.address.country"), Value::from("DE"));
    assert_eq!(eval("items[1].price"), Value::Number(4.5));
}

#[test]
fn test_unknown_field() {
    let err = eval_err("user.phone");
    assert_eq!(
        err.kind,
        DiagnosticKind::UnknownField {
            field: "phone".into()
        }
    );
    assert_eq!(err.position.column, 6);
}

#[test]
fn test_member_access_on_non_record() {
    let err = eval_err("amount.value");
    assert_eq!(
        err.message(),
        "type mismatch: `.value` cannot be applied to number"
    );
}

#[test]
fn test_indexing_errors() {
    for source in ["tags[2]", "tags[-1]", "tags[0.5]"] {
        assert_eq!(eval_err(source).code(), "DSL_INDEX_OUT_OF_RANGE", "{}", source);
    }
    assert_eq!(eval_err("tags['0']").code(), "DSL_TYPE_MISMATCH");
    assert_eq!(eval_err("status[0]").code(), "DSL_TYPE_MISMATCH");
}

#[test]
fn test_list_literals_evaluate_elements() {
    assert_eq!(
        eval("[amount, status][1]"),
        Value::from("pending")
    );
}

// ============================================================================
// Built-in Functions
// ============================================================================

#[test]
fn test_string_functions() {
    assert_eq!(eval("len('héllo')"), Value::Number(5.0));
    assert_eq!(eval("upper(status)"), Value::from("PENDING"));
    assert_eq!(eval("lower('MiXeD')"), Value::from("mixed"));
    assert_eq!(eval("trim('  x  ')"), Value::from("x"));
    assert_eq!(eval("starts_with(email, 'ann')"), Value::Boolean(true));
    assert_eq!(eval("ends_with(email, '.org')"), Value::Boolean(false));
    assert_eq!(eval("matches(email, '^[a-z]+@example\\\\.com$')"), Value::Boolean(true));
}

#[test]
fn test_collection_functions() {
    assert_eq!(eval("len(tags)"), Value::Number(2.0));
    assert_eq!(eval("len(user)"), Value::Number(3.0));
    assert_eq!(eval("contains(tags, 'vip')"), Value::Boolean(true));
    assert_eq!(eval("contains(email, '@')"), Value::Boolean(true));
    assert_eq!(eval("contains(user, 'age')"), Value::Boolean(true));
    assert_eq!(
        eval("keys(user.address)"),
        Value::List(vec![Value::from("country")])
    );
}

#[test]
fn test_numeric_functions() {
    assert_eq!(eval("abs(-3)"), Value::Number(3.0));
    assert_eq!(eval("floor(2.7)"), Value::Number(2.0));
    assert_eq!(eval("ceil(2.1)"), Value::Number(3.0));
    assert_eq!(eval("round(2.5)"), Value::Number(3.0));
    // Past the range of Decimal, where every double is already whole
    assert_eq!(eval("round(100000000000000000000000000000000)"), Value::Number(1e32));
    assert_eq!(eval("round(-100000000000000000000000000000000, 2)"), Value::Number(-1e32));
    assert_eq!(eval("min([3, 1, 2])"), Value::Number(1.0));
    assert_eq!(eval("max('a', 'b')"), Value::from("b"));
    assert_eq!(eval("sum([1, 2, 3.5])"), Value::Number(6.5));
    assert_eq!(eval("sum([])"), Value::Number(0.0));
}

#[test]
fn test_type_and_string() {
    assert_eq!(eval("type(nothing)"), Value::from("null"));
    assert_eq!(eval("type(user)"), Value::from("record"));
    assert_eq!(eval("string(1.5)"), Value::from("1.5"));
    assert_eq!(eval("string(tags)"), Value::from(r#"["vip", "eu"]"#));
}

#[test]
fn test_invalid_arguments() {
    assert_eq!(eval_err("round(1, 2.5)").code(), "DSL_INVALID_ARGUMENT");
    assert_eq!(eval_err("matches('a', '(')").code(), "DSL_INVALID_ARGUMENT");
    assert_eq!(eval_err("max([])").code(), "DSL_INVALID_ARGUMENT");
    assert_eq!(eval_err("upper(1)").code(), "DSL_TYPE_MISMATCH");
}

#[test]
fn test_unknown_function() {
    let err = eval_err("shout(status)");
    assert_eq!(
        err.kind,
        DiagnosticKind::UnknownFunction {
            name: "shout".into()
        }
    );
    assert_eq!(err.position, Position::start());
}

#[test]
fn test_arity_is_checked_before_arguments() {
    let err = eval_err("len(missing, 2)");
    assert_eq!(err.message(), "function `len` expects 1 argument(s), got 2");

    let err = eval_err("round()");
    assert_eq!(
        err.kind,
        DiagnosticKind::ArityMismatch {
            function: "round".into(),
            expected: "1 or 2".into(),
            found: 0,
        }
    );
}

#[test]
fn test_function_error_is_positioned_at_call() {
    let err = eval_err("amount > 0 and upper(amount) == 'X'");
    assert_eq!(err.position.column, 16);
}

// ============================================================================
// Host Configuration
// ============================================================================

#[test]
fn test_host_registered_function() {
    fn vat(args: &[Value]) -> Result<Value, DiagnosticKind> {
        match args[0].as_number() {
            Some(n) => Ok(Value::Number(n * 1.25)),
            None => Err(DiagnosticKind::type_mismatch("vat", &[args[0].kind()])),
        }
    }

    let mut registry = FunctionRegistry::standard();
    registry.register("vat", 1, vat);
    let engine = Engine::new().with_registry(registry);

    let context = EvalContext::new().with("net", 100);
    assert_eq!(engine.run("vat(net)", &context), Ok(Value::Number(125.0)));
    // The default engine does not know it
    assert_eq!(
        rule_dsl::run("vat(net)", &context).unwrap_err().code(),
        "DSL_UNKNOWN_FUNCTION"
    );
}

#[test]
fn test_context_from_json_requires_object() {
    assert!(EvalContext::from_json(json!([1, 2])).is_none());
    let context = EvalContext::from_json(json!({"a": 1})).unwrap();
    assert_eq!(context.len(), 1);
}

#[test]
fn test_context_from_iterator() {
    let context: EvalContext = [("x", Value::Number(2.0)), ("y", Value::Number(3.0))]
        .into_iter()
        .collect();
    assert_eq!(rule_dsl::run("x * y", &context), Ok(Value::Number(6.0)));
}

#[test]
fn test_result_serializes_as_json() {
    let value = eval("[amount, user.name, nothing, 0.5]");
    assert_eq!(
        serde_json::to_value(&value).unwrap(),
        json!([1500, "Ann", null, 0.5])
    );
}
