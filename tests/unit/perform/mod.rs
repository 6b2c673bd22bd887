use std::collections::BTreeSet;

use super::*;
use crate::animation::keyframe::{Keyframe, Timeline};
use crate::flow::{FlowInput, FlowNode, FlowNodeKind};
use crate::foundation::ids::{FlowNodeId, LayerId, PropertyId};
use crate::scene::dsl::{
    SceneBuilder, array_modifier_id, array_modifier_property_id, layer_property_id,
};
use crate::scene::model::{LayerKind, Scene};
use crate::scene::names;
use crate::value::types::{OriginBehavior, TransformBehavior, Value, ValueType};

fn two_layers() -> SceneBuilder {
    SceneBuilder::new()
        .composition("main", 100, 100, 24)
        .layer("main", "l", LayerKind::Rect)
        .unwrap()
        .layer("main", "m", LayerKind::Ellipse)
        .unwrap()
        .content_property("l", "Fill", Value::Number(1.0))
        .unwrap()
}

fn ramp(id: &str) -> Timeline {
    Timeline::new(id, vec![
        Keyframe::new("k0", 0, 0.0),
        Keyframe::new("k1", 10, 50.0),
    ])
}

fn props(ids: &[PropertyId]) -> ChangeSet {
    ChangeSet {
        properties: ids.to_vec(),
        ..ChangeSet::default()
    }
}

fn only(layer: &str, performables: &[Performable]) -> Vec<LayerActions> {
    vec![LayerActions {
        layer_id: LayerId::from(layer),
        performables: performables.iter().copied().collect(),
    }]
}

fn classify(registry: &PerformableRegistry, id: &PropertyId) -> Performable {
    registry.entry(id).unwrap().1.performable
}

#[test]
fn position_change_is_position_only() {
    let scene = two_layers().build().unwrap();
    let registry = PerformableRegistry::build(&scene);
    let x = layer_property_id("l", names::POSITION_X);
    assert_eq!(
        registry.actions_for(&scene, &props(&[x])),
        only("l", &[Performable::UpdatePosition])
    );
}

#[test]
fn rotation_change_is_a_transform_update() {
    let scene = two_layers().build().unwrap();
    let registry = PerformableRegistry::build(&scene);
    let rotation = layer_property_id("l", names::ROTATION);
    assert_eq!(
        registry.actions_for(&scene, &props(&[rotation])),
        only("l", &[Performable::UpdateTransform])
    );
}

#[test]
fn transform_update_subsumes_position() {
    let scene = two_layers().build().unwrap();
    let registry = PerformableRegistry::build(&scene);
    let changes = props(&[
        layer_property_id("l", names::POSITION_Y),
        layer_property_id("l", names::ROTATION),
    ]);
    assert_eq!(
        registry.actions_for(&scene, &changes),
        only("l", &[Performable::UpdateTransform])
    );

    let backward = ChangeSet {
        direction: ChangeDirection::Backward,
        ..changes.clone()
    };
    assert_eq!(
        registry.actions_for(&scene, &backward),
        registry.actions_for(&scene, &changes)
    );
}

#[test]
fn classification_follows_tree_position() {
    let (b, n) = two_layers()
        .array_modifier("l", 3, TransformBehavior::Recursive, OriginBehavior::Relative)
        .unwrap();
    let scene = b.build().unwrap();
    let registry = PerformableRegistry::build(&scene);
    let am = |name: &str| array_modifier_property_id("l", n, name);

    assert_eq!(classify(&registry, &am(names::COUNT)), Performable::UpdateArrayModifierCount);
    for name in [
        names::ROTATION,
        names::POSITION_X,
        names::SCALE_Y,
        names::ORIGIN_X,
        names::TRANSFORM_BEHAVIOR,
        names::ORIGIN_BEHAVIOR,
        names::ROTATION_CORRECTION,
    ] {
        assert_eq!(
            classify(&registry, &am(name)),
            Performable::UpdateArrayModifierTransform,
            "{name}"
        );
    }
    assert_eq!(
        classify(&registry, &layer_property_id("l", names::POSITION)),
        Performable::UpdatePosition
    );
    assert_eq!(
        classify(&registry, &layer_property_id("l", names::ANCHOR_X)),
        Performable::UpdateTransform
    );
    assert_eq!(classify(&registry, &layer_property_id("l", "Fill")), Performable::DrawLayer);
}

#[test]
fn node_changes_map_through_their_graph() {
    let (b, n) = two_layers()
        .array_modifier("m", 2, TransformBehavior::Recursive, OriginBehavior::Relative)
        .unwrap();
    let scene = b
        .layer_graph("l", "gl", vec![
            FlowNode::new("lit", "", FlowNodeKind::NumInput)
                .with_input(0, FlowInput::literal("", Value::Number(3.0))),
            FlowNode::new("out", "", FlowNodeKind::PropertyOutput {
                property_id: layer_property_id("m", names::ROTATION),
            })
            .with_input(0, FlowInput::connected("", ValueType::Number, "lit", 0)),
        ])
        .unwrap()
        .array_modifier_graph(&array_modifier_id("m", n), "gm", vec![FlowNode::new(
            "idx",
            "",
            FlowNodeKind::ArrayModifierIndex,
        )])
        .unwrap()
        .build()
        .unwrap();
    let registry = PerformableRegistry::build(&scene);

    let changes = ChangeSet {
        nodes: vec![FlowNodeId::from("lit")],
        ..ChangeSet::default()
    };
    assert_eq!(
        registry.actions_for(&scene, &changes),
        only("m", &[Performable::UpdateTransform])
    );

    let changes = ChangeSet {
        nodes: vec![FlowNodeId::from("idx"), FlowNodeId::from("gone")],
        ..ChangeSet::default()
    };
    assert_eq!(
        registry.actions_for(&scene, &changes),
        only("m", &[Performable::UpdateArrayModifierTransform])
    );
}

#[test]
fn layer_change_redraws_and_retransforms() {
    let scene = two_layers().build().unwrap();
    let registry = PerformableRegistry::build(&scene);
    let changes = ChangeSet {
        layers: vec![LayerId::from("m")],
        ..ChangeSet::default()
    };
    assert_eq!(
        registry.actions_for(&scene, &changes),
        only("m", &[Performable::DrawLayer, Performable::UpdateTransform])
    );
}

#[test]
fn frame_tick_touches_only_moving_layers() {
    let x = layer_property_id("l", names::POSITION_X);
    let scene = two_layers().animate(&x, ramp("tx")).unwrap().build().unwrap();
    let registry = PerformableRegistry::build(&scene);

    assert_eq!(
        registry.actions_on_frame_index_change(&BTreeSet::new()),
        only("l", &[Performable::UpdatePosition])
    );

    let dependent = BTreeSet::from([layer_property_id("m", names::ROTATION)]);
    let actions = registry.actions_on_frame_index_change(&dependent);
    let layers: Vec<&str> = actions.iter().map(|a| a.layer_id.as_str()).collect();
    assert_eq!(layers, vec!["l", "m"]);
    assert_eq!(
        actions[1].performables,
        BTreeSet::from([Performable::UpdateTransform])
    );
}

#[test]
fn sync_rebuilds_only_on_structural_change() {
    let scene = two_layers().build().unwrap();
    let mut registry = PerformableRegistry::build(&scene);
    let l = LayerId::from("l");
    let x = layer_property_id("l", names::POSITION_X);

    let restyled: Scene = two_layers()
        .value(&x, Value::Number(40.0))
        .unwrap()
        .build()
        .unwrap();
    assert!(!registry.sync_layer(&restyled, &l));

    let snapshot = registry.clone();
    let animated = two_layers().animate(&x, ramp("tx")).unwrap().build().unwrap();
    assert!(registry.sync_layer(&animated, &l));
    assert!(registry.entry(&x).unwrap().1.is_animated);
    assert!(!snapshot.entry(&x).unwrap().1.is_animated);
    assert_ne!(
        registry.layer(&l).unwrap().fingerprint,
        snapshot.layer(&l).unwrap().fingerprint
    );

    let without_l = SceneBuilder::new()
        .composition("main", 100, 100, 24)
        .layer("main", "m", LayerKind::Ellipse)
        .unwrap()
        .build()
        .unwrap();
    assert!(registry.sync_layer(&without_l, &l));
    assert!(registry.layer(&l).is_none());
    assert!(registry.entry(&x).is_none());
}
