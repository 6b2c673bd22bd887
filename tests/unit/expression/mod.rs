use super::*;

fn run(src: &str, scope: &mut ExprScope) -> Result<(), ExprError> {
    BuiltinExpressionEvaluator.evaluate(src, scope)
}

fn num(scope: &ExprScope, name: &str) -> f64 {
    match scope.get(name) {
        Some(ExprValue::Number(v)) => *v,
        other => panic!("{name}: expected number, got {other:?}"),
    }
}

#[test]
fn assigns_outputs_from_inputs() {
    let mut scope = ExprScope::new();
    scope.set("a", ExprValue::Number(3.0));
    scope.set("b", ExprValue::Number(4.0));
    run("out = sqrt(a^2 + b^2)", &mut scope).unwrap();
    assert_eq!(num(&scope, "out"), 5.0);
    assert_eq!(num(&scope, "a"), 3.0);
}

#[test]
fn statements_see_earlier_assignments() {
    let mut scope = ExprScope::new();
    run("x = 2\ny = x * 10; z = y + x", &mut scope).unwrap();
    assert_eq!(num(&scope, "z"), 22.0);
}

#[test]
fn constants_are_available_but_not_written_back() {
    let mut scope = ExprScope::new();
    run("half = pi / 2; full = tau", &mut scope).unwrap();
    assert!((num(&scope, "half") - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    assert!((num(&scope, "full") - std::f64::consts::TAU).abs() < 1e-12);
    assert!(scope.get("pi").is_none());
}

#[test]
fn inputs_shadow_constants() {
    let mut scope = ExprScope::new();
    scope.set("e", ExprValue::Number(1.0));
    run("out = e + 1", &mut scope).unwrap();
    assert_eq!(num(&scope, "out"), 2.0);
}

#[test]
fn vectors_broadcast_and_index() {
    let mut scope = ExprScope::new();
    scope.set("p", ExprValue::vector(&[1.0, 2.0]));
    run("q = p * 2 + [10, 20]; qx = q.x; qy = q[1]", &mut scope).unwrap();
    assert_eq!(scope.get("q"), Some(&ExprValue::vector(&[12.0, 24.0])));
    assert_eq!(num(&scope, "qx"), 12.0);
    assert_eq!(num(&scope, "qy"), 24.0);
}

#[test]
fn ternary_and_comparisons() {
    let mut scope = ExprScope::new();
    scope.set("t", ExprValue::Number(0.75));
    run("out = t > 0.5 && !(t > 1) ? 1 : -1", &mut scope).unwrap();
    assert_eq!(num(&scope, "out"), 1.0);
}

#[test]
fn builtins_cover_common_math() {
    let mut scope = ExprScope::new();
    run(
        "a = clamp(5, 0, 1); b = lerp(10, 20, 0.25); c = round(2.6); \
         d = atan2(1, 1); f = max([1, 5], 3)",
        &mut scope,
    )
    .unwrap();
    assert_eq!(num(&scope, "a"), 1.0);
    assert_eq!(num(&scope, "b"), 12.5);
    assert_eq!(num(&scope, "c"), 3.0);
    assert!((num(&scope, "d") - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    assert_eq!(scope.get("f"), Some(&ExprValue::vector(&[3.0, 5.0])));
}

#[test]
fn last_bare_expression_is_recorded() {
    let mut scope = ExprScope::new();
    run("x = 4; x * 2", &mut scope).unwrap();
    assert_eq!(scope.last(), Some(&ExprValue::Number(8.0)));
}

#[test]
fn undefined_variable_is_an_error() {
    let mut scope = ExprScope::new();
    let err = run("out = missing + 1", &mut scope).unwrap_err();
    assert!(err.message.contains("missing"), "{err}");
    assert!(scope.get("out").is_none());
}

#[test]
fn type_errors_are_reported() {
    let mut scope = ExprScope::new();
    assert!(run("out = true + 1", &mut scope).is_err());
    assert!(run("out = [1, 2] + [1, 2, 3]", &mut scope).is_err());
    assert!(run("out = [1, 2][5]", &mut scope).is_err());
    assert!(run("out = 1 +", &mut scope).is_err());
}

#[test]
fn syntax_error_carries_offset() {
    let mut scope = ExprScope::new();
    let err = run("out = 1 $ 2", &mut scope).unwrap_err();
    assert_eq!(err.offset, 8);
}

#[test]
fn runaway_nesting_is_an_error() {
    let mut scope = ExprScope::new();
    let nested = format!("out = {}1{}", "(".repeat(40), ")".repeat(40));
    run(&nested, &mut scope).unwrap();
    assert_eq!(num(&scope, "out"), 1.0);

    let deep = format!("out = {}1{}", "(".repeat(200_000), ")".repeat(200_000));
    let err = run(&deep, &mut scope).unwrap_err();
    assert!(err.message.contains("nests deeper"), "{err}");
    assert!(run(&format!("out = {}1", "-".repeat(100_000)), &mut scope).is_err());
    assert!(run(&format!("out = 2{}", "^2".repeat(100_000)), &mut scope).is_err());
}

#[test]
fn long_flat_chains_are_bounded_too() {
    let mut scope = ExprScope::new();
    run(&format!("out = 0{}", " + 1".repeat(500)), &mut scope).unwrap();
    assert_eq!(num(&scope, "out"), 500.0);
    assert!(run(&format!("out = 0{}", " + 1".repeat(100_000)), &mut scope).is_err());
}
