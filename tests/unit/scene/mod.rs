use super::*;
use crate::animation::keyframe::{Keyframe, Timeline};
use crate::flow::graph::{FlowInput, FlowNode, FlowNodeKind};
use crate::foundation::ids::{LayerId, PropertyId};
use crate::scene::dsl::{SceneBuilder, array_modifier_property_id, layer_property_id};
use crate::scene::model::{LayerKind, PropertyNode};
use crate::value::types::{OriginBehavior, TransformBehavior, Value, ValueType};

fn two_layer_scene() -> Scene {
    let (b, _) = SceneBuilder::new()
        .composition("main", 640, 360, 48)
        .composition("inner", 100, 100, 24)
        .layer("main", "box", LayerKind::Rect)
        .unwrap()
        .layer("main", "nest", LayerKind::Composition {
            composition_id: "inner".into(),
        })
        .unwrap()
        .layer("inner", "dot", LayerKind::Ellipse)
        .unwrap()
        .array_modifier("box", 3, TransformBehavior::Recursive, OriginBehavior::Relative)
        .unwrap();
    b.build().unwrap()
}

#[test]
fn builder_lays_out_standard_transform() {
    let scene = two_layer_scene();
    let layer = scene.layer(&LayerId::from("box")).unwrap();
    let transform = scene.transform_group(layer).unwrap();
    assert_eq!(transform.properties.len(), 5);

    let px = scene
        .leaf_at(&layer.properties, &[names::TRANSFORM, names::POSITION, names::POSITION_X])
        .unwrap();
    assert_eq!(px.id, layer_property_id("box", names::POSITION_X));

    let leaves = scene.leaves(&layer_property_id("box", names::SCALE));
    let got: Vec<&str> = leaves.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(got, vec![names::SCALE_X, names::SCALE_Y]);
}

#[test]
fn array_modifiers_are_found_in_order() {
    let scene = two_layer_scene();
    let layer = scene.layer(&LayerId::from("box")).unwrap();
    let mods = scene.array_modifiers(layer);
    assert_eq!(mods.len(), 1);
    assert!(mods[0]
        .properties
        .contains(&array_modifier_property_id("box", 0, names::COUNT)));
    assert!(scene.array_modifiers(scene.layer(&LayerId::from("dot")).unwrap()).is_empty());
}

#[test]
fn json_round_trip_preserves_snapshot() {
    let scene = two_layer_scene();
    let json = scene.to_json_pretty().unwrap();
    let back = Scene::from_json_str(&json).unwrap();
    assert_eq!(back, scene);
    back.validate().unwrap();
}

#[test]
fn validation_reports_missing_transform() {
    let mut scene = two_layer_scene();
    let layer = scene.layers.get_mut(&LayerId::from("dot")).unwrap();
    layer.properties.retain(|p| p != &layer_property_id("dot", names::TRANSFORM));
    let err = scene.validate().unwrap_err().to_string();
    assert!(err.contains("$.layers.dot: missing Transform group"), "{err}");
}

#[test]
fn validation_collects_several_issues() {
    let mut scene = two_layer_scene();
    scene.properties.insert(
        PropertyId::from("box/Ghost"),
        PropertyNode::Compound(crate::scene::model::CompoundProperty {
            id: "box/Ghost".into(),
            layer_id: "box".into(),
            name: "Ghost".to_owned(),
            properties: vec!["nowhere".into()],
        }),
    );
    let node = FlowNode::new("n1", "g", FlowNodeKind::DegToRad)
        .with_input(0, FlowInput::connected("", ValueType::Number, "missing", 0));
    scene.flow_nodes.insert(node.id.clone(), node);

    let err = scene.validate().unwrap_err().to_string();
    assert!(err.contains("unknown child 'nowhere'"), "{err}");
    assert!(err.contains("compound must hold"), "{err}");
    assert!(err.contains("points at unknown node 'missing'"), "{err}");
}

#[test]
fn animating_non_number_is_rejected() {
    let scene = SceneBuilder::new()
        .composition("c", 10, 10, 10)
        .layer("c", "l", LayerKind::Rect)
        .unwrap()
        .content_property("l", "Fill", Value::Bool(true))
        .unwrap()
        .animate(
            &layer_property_id("l", "Fill"),
            Timeline::new("t", vec![Keyframe::new("k", 0, 1.0)]),
        )
        .unwrap()
        .build();
    let err = scene.unwrap_err().to_string();
    assert!(err.contains("only number properties can be animated"), "{err}");
}

#[test]
fn nesting_cycle_is_rejected() {
    let scene = SceneBuilder::new()
        .composition("a", 10, 10, 10)
        .composition("b", 10, 10, 10)
        .layer("a", "to_b", LayerKind::Composition {
            composition_id: "b".into(),
        })
        .unwrap()
        .layer("b", "to_a", LayerKind::Composition {
            composition_id: "a".into(),
        })
        .unwrap()
        .build();
    let err = scene.unwrap_err().to_string();
    assert!(err.contains("composition nesting cycle"), "{err}");
}

#[test]
fn unknown_node_kinds_deserialize() {
    let node: FlowNode = serde_json::from_str(
        r#"{"id":"n","graph_id":"g","kind":{"type":"teleport"},"inputs":[],"outputs":[]}"#,
    )
    .unwrap();
    assert_eq!(node.kind, FlowNodeKind::Unknown);
}

#[test]
fn parse_errors_are_serde_errors() {
    let err = Scene::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, crate::foundation::error::PropelError::Serde(_)));
}

#[test]
fn nested_composition_borrows_from_the_layer() {
    let layer = two_layer_scene().layer(&LayerId::from("nest")).unwrap().clone();
    let nested = {
        let empty = Scene::default();
        empty.nested_composition(&layer)
    };
    assert_eq!(nested.map(|id| id.as_str()), Some("inner"));
    let rect = two_layer_scene().layer(&LayerId::from("box")).unwrap().clone();
    assert!(Scene::default().nested_composition(&rect).is_none());
}
