use super::*;
use serde_json::json;

fn samples() -> Vec<Value> {
    vec![
        Value::Any(json!({"anything": [1, 2]})),
        Value::Number(4.5),
        Value::Vec2(Vec2::new(1.0, -2.0)),
        Value::Rect(Rect::new(0.0, 0.0, 10.0, 20.0)),
        Value::Rgba(Rgba::new(10.0, 20.0, 30.0, 0.5)),
        Value::Bool(true),
        Value::OriginBehavior(OriginBehavior::Absolute),
        Value::TransformBehavior(TransformBehavior::AbsoluteForComputed),
    ]
}

#[test]
fn identity_coercion_returns_input() {
    for v in samples() {
        let t = v.value_type();
        assert_eq!(coerce(t, t, &v), Some(v.clone()), "identity failed for {t:?}");
    }
}

#[test]
fn number_broadcasts_to_vec2() {
    assert_eq!(
        coerce(ValueType::Number, ValueType::Vec2, &Value::Number(3.0)),
        Some(Value::Vec2(Vec2::new(3.0, 3.0)))
    );
}

#[test]
fn everything_coerces_to_any() {
    for v in samples() {
        assert_eq!(coerce(v.value_type(), ValueType::Any, &v), Some(v.clone()));
    }
}

#[test]
fn any_parses_structural_shapes() {
    let any = |j: serde_json::Value| Value::Any(j);

    assert_eq!(
        coerce(ValueType::Any, ValueType::Number, &any(json!(" 12.5 "))),
        Some(Value::Number(12.5))
    );
    assert_eq!(
        coerce(ValueType::Any, ValueType::Vec2, &any(json!({"x": 1, "y": "2"}))),
        Some(Value::Vec2(Vec2::new(1.0, 2.0)))
    );
    assert_eq!(
        coerce(ValueType::Any, ValueType::Vec2, &any(json!([3, 4]))),
        Some(Value::Vec2(Vec2::new(3.0, 4.0)))
    );
    assert_eq!(
        coerce(
            ValueType::Any,
            ValueType::Rect,
            &any(json!({"left": 1, "top": 2, "width": 10, "height": 5}))
        ),
        Some(Value::Rect(Rect::new(1.0, 2.0, 11.0, 7.0)))
    );
    assert_eq!(
        coerce(ValueType::Any, ValueType::Rgba, &any(json!([255, 0, 0]))),
        Some(Value::Rgba(Rgba::new(255.0, 0.0, 0.0, 1.0)))
    );
    assert_eq!(
        coerce(
            ValueType::Any,
            ValueType::TransformBehavior,
            &any(json!("absolute_for_computed"))
        ),
        Some(Value::TransformBehavior(
            TransformBehavior::AbsoluteForComputed
        ))
    );
}

#[test]
fn failed_parses_yield_none() {
    let any = |j: serde_json::Value| Value::Any(j);
    assert_eq!(coerce(ValueType::Any, ValueType::Number, &any(json!("abc"))), None);
    assert_eq!(coerce(ValueType::Any, ValueType::Vec2, &any(json!([1, 2, 3]))), None);
    assert_eq!(coerce(ValueType::Any, ValueType::Rect, &any(json!({"left": 1}))), None);
    assert_eq!(coerce(ValueType::Any, ValueType::OriginBehavior, &any(json!(3))), None);
}

#[test]
fn illegal_pairs_yield_none() {
    assert_eq!(
        coerce(
            ValueType::Vec2,
            ValueType::Number,
            &Value::Vec2(Vec2::new(1.0, 2.0))
        ),
        None
    );
    assert_eq!(
        coerce(ValueType::Rgba, ValueType::Rect, &Value::Rgba(Rgba::black())),
        None
    );
}

#[test]
fn can_convert_is_symmetric_with_can_connect() {
    let number = can_convert(ValueType::Number);
    assert!(number.contains(&ValueType::Number));
    assert!(number.contains(&ValueType::Vec2));
    assert!(number.contains(&ValueType::Any));
    assert!(!number.contains(&ValueType::Rgba));

    let vec2 = can_convert(ValueType::Vec2);
    assert!(vec2.contains(&ValueType::Number));

    assert_eq!(can_convert(ValueType::Any).len(), ValueType::ALL.len());
    for a in ValueType::ALL {
        for b in can_convert(a) {
            assert!(can_convert(b).contains(&a), "{a:?} <-> {b:?} not symmetric");
        }
    }
}
