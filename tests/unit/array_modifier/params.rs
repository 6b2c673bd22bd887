use super::*;
use crate::foundation::ids::LayerId;
use crate::scene::dsl::{SceneBuilder, array_modifier_property_id};
use crate::scene::model::LayerKind;

fn scene() -> Scene {
    let (b, _) = SceneBuilder::new()
        .composition("c", 100, 100, 10)
        .layer("c", "l", LayerKind::Rect)
        .unwrap()
        .array_modifier("l", 3, TransformBehavior::Recursive, OriginBehavior::Absolute)
        .unwrap();
    b.build().unwrap()
}

fn modifier(scene: &Scene) -> &PropertyGroup {
    scene.array_modifiers(scene.layer(&LayerId::from("l")).unwrap())[0]
}

fn read(scene: &Scene, overrides: &[(&str, Value)], max: u32) -> PropelResult<ArrayModifierParams> {
    let values: BTreeMap<PropertyId, Value> = overrides
        .iter()
        .map(|(name, v)| (array_modifier_property_id("l", 0, name), v.clone()))
        .collect();
    read_params(
        scene,
        modifier(scene),
        |id| {
            values.get(id).cloned().or_else(|| {
                scene.properties.get(id).and_then(|n| n.as_property()).map(|p| p.value.clone())
            })
        },
        max,
    )
}

#[test]
fn defaults_come_from_the_group() {
    let s = scene();
    let p = read(&s, &[], 100).unwrap();
    assert_eq!(p.count, 3);
    assert_eq!(p.policy, TransformBehavior::Recursive);
    assert_eq!(p.origin_behavior, OriginBehavior::Absolute);
    assert_eq!(p.origin, Vec2::ZERO);
    assert_eq!(p.correction, 0.0);
}

#[test]
fn count_is_floored_and_clamped() {
    let s = scene();
    let count = |v: f64, max| read(&s, &[(names::COUNT, Value::Number(v))], max).unwrap().count;
    assert_eq!(count(2.7, 100), 2);
    assert_eq!(count(1e9, 10), 10);
    assert_eq!(count(-4.0, 10), 0);
    assert_eq!(count(f64::NAN, 10), 0);
    assert_eq!(count(f64::INFINITY, 10), 0);
}

#[test]
fn policy_strings_are_parsed_or_rejected() {
    let s = scene();
    let ok = read(
        &s,
        &[(names::TRANSFORM_BEHAVIOR, Value::Any(serde_json::json!("absolute_for_computed")))],
        10,
    )
    .unwrap();
    assert_eq!(ok.policy, TransformBehavior::AbsoluteForComputed);

    let sideways = Value::Any(serde_json::json!("sideways"));
    let err = read(&s, &[(names::TRANSFORM_BEHAVIOR, sideways)], 10).unwrap_err();
    assert!(err.is_structural(), "{err}");
    assert!(err.to_string().contains("unsupported transform behavior"), "{err}");
}

#[test]
fn computed_fields_follow_the_index_table() {
    let s = scene();
    let leaves = StepLeaves::of(&s, modifier(&s));
    let mut table = BTreeMap::new();
    table.insert(array_modifier_property_id("l", 0, names::ROTATION), Value::Number(5.0));
    let computed = leaves.computed_in(&table);
    assert!(computed.rotation);
    assert!(!computed.translate_x && !computed.scale_y);

    let step = leaves.read(|id| table.get(id).cloned());
    assert_eq!(step.rotation, 5.0);
    assert_eq!(step.scale, Vec2::new(1.0, 1.0));
}
