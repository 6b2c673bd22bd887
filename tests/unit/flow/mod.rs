use std::collections::{BTreeMap, BTreeSet};

use super::*;
use crate::expression::{BuiltinExpressionEvaluator, ExpressionEvaluator};
use crate::flow::schedule::schedule_graphs;
use crate::foundation::core::{Rgba, Vec2};
use crate::foundation::ids::{CompositionId, FlowGraphId, FlowNodeId, PropertyId};
use crate::scene::dsl::{
    SceneBuilder, array_modifier_id, array_modifier_property_id, layer_property_id,
};
use crate::scene::model::{LayerKind, Scene};
use crate::scene::names;
use crate::value::types::{OriginBehavior, TransformBehavior, Value, ValueType};

struct TestEnv {
    values: BTreeMap<PropertyId, Value>,
    frame_dependent: BTreeSet<PropertyId>,
    index: Option<usize>,
    exprs: BuiltinExpressionEvaluator,
}

impl TestEnv {
    fn new(scene: &Scene) -> Self {
        let values = scene
            .properties
            .values()
            .filter_map(|n| n.as_property())
            .map(|p| (p.id.clone(), p.value.clone()))
            .collect();
        Self {
            values,
            frame_dependent: BTreeSet::new(),
            index: None,
            exprs: BuiltinExpressionEvaluator,
        }
    }
}

impl FlowEnv for TestEnv {
    fn value(&self, property: &PropertyId) -> Option<Value> {
        self.values.get(property).cloned()
    }

    fn is_frame_dependent(&self, property: &PropertyId) -> bool {
        self.frame_dependent.contains(property)
    }

    fn array_index(&self) -> Option<usize> {
        self.index
    }

    fn composition(&self, _id: Option<&CompositionId>) -> Option<CompositionInfo> {
        Some(CompositionInfo {
            frame_index: 12.0,
            length: 48,
            size: Vec2::new(640.0, 360.0),
        })
    }

    fn expressions(&self) -> &dyn ExpressionEvaluator {
        &self.exprs
    }
}

fn base() -> SceneBuilder {
    SceneBuilder::new()
        .composition("main", 640, 360, 48)
        .layer("main", "l", LayerKind::Rect)
        .unwrap()
        .content_property("l", "Angle", Value::Number(180.0))
        .unwrap()
        .content_property("l", "Tint", Value::Rgba(Rgba::new(255.0, 0.0, 0.0, 1.0)))
        .unwrap()
}

fn pid(name: &str) -> PropertyId {
    layer_property_id("l", name)
}

fn input_of(id: &str, property: &str, outputs: &[ValueType]) -> FlowNode {
    let mut node = FlowNode::new(id, "", FlowNodeKind::PropertyInput {
        property_id: pid(property),
    });
    for t in outputs {
        node = node.with_output(FlowOutput::new("", *t));
    }
    node
}

fn output_to(id: &str, property: &str, inputs: Vec<FlowInput>) -> FlowNode {
    let mut node = FlowNode::new(id, "", FlowNodeKind::PropertyOutput {
        property_id: pid(property),
    });
    for (i, input) in inputs.into_iter().enumerate() {
        node = node.with_input(i, input);
    }
    node
}

fn wire(producer: &str, index: usize) -> FlowInput {
    FlowInput::connected("", ValueType::Number, producer, index)
}

fn run(scene: &Scene, graph: &str, env: &TestEnv) -> GraphOutcome {
    let graph = scene.flow_graph(&FlowGraphId::from(graph)).unwrap();
    evaluate_graph(scene, graph, env)
}

#[test]
fn deg_to_rad_of_property() {
    let scene = base()
        .layer_graph("l", "g", vec![
            input_of("angle", "Angle", &[ValueType::Number]),
            FlowNode::new("rad", "", FlowNodeKind::DegToRad).with_input(0, wire("angle", 0)),
            output_to("out", names::ROTATION, vec![wire("rad", 0)]),
        ])
        .unwrap()
        .build()
        .unwrap();
    let env = TestEnv::new(&scene);

    let outcome = run(&scene, "g", &env);
    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    assert_eq!(outcome.writes.len(), 1);
    let (leaf, value) = &outcome.writes[0];
    assert_eq!(leaf, &pid(names::ROTATION));
    assert!((value.as_number().unwrap() - std::f64::consts::PI).abs() < 1e-9);
    assert!(outcome.frame_dependent.is_empty());
}

#[test]
fn only_connected_fields_are_written() {
    let scene = base()
        .layer_graph("l", "g", vec![
            FlowNode::new("n", "", FlowNodeKind::NumInput)
                .with_input(0, FlowInput::literal("", Value::Number(42.0))),
            output_to("out", names::POSITION, vec![
                wire("n", 0),
                FlowInput::literal("", Value::Number(-1.0)),
            ]),
        ])
        .unwrap()
        .build()
        .unwrap();
    let env = TestEnv::new(&scene);

    let outcome = run(&scene, "g", &env);
    assert_eq!(outcome.writes, vec![(pid(names::POSITION_X), Value::Number(42.0))]);
}

#[test]
fn cycle_is_reported_once_for_the_terminal() {
    let scene = base()
        .layer_graph("l", "g", vec![
            FlowNode::new("a", "", FlowNodeKind::NumAdd).with_input(0, wire("b", 0)),
            FlowNode::new("b", "", FlowNodeKind::NumAdd).with_input(0, wire("a", 0)),
            output_to("out", names::ROTATION, vec![wire("a", 0)]),
        ])
        .unwrap()
        .build()
        .unwrap();
    let env = TestEnv::new(&scene);

    let outcome = run(&scene, "g", &env);
    assert!(outcome.writes.is_empty());
    assert_eq!(outcome.errors.len(), 1, "{:?}", outcome.errors);
    let err = &outcome.errors[0];
    assert_eq!(err.node_id, Some(FlowNodeId::from("out")));
    let CompositionErrorKind::Cycle { nodes } = &err.kind else {
        panic!("expected a cycle, got {err}");
    };
    assert!(nodes.contains(&FlowNodeId::from("a")));
    assert!(nodes.contains(&FlowNodeId::from("b")));
}

#[test]
fn failures_poison_consumers_without_duplicates() {
    let scene = base()
        .layer_graph("l", "g", vec![
            FlowNode::new("bad", "", FlowNodeKind::Unknown)
                .with_output(FlowOutput::new("", ValueType::Number)),
            FlowNode::new("rad", "", FlowNodeKind::DegToRad).with_input(0, wire("bad", 0)),
            output_to("out", names::ROTATION, vec![wire("rad", 0)]),
            FlowNode::new("ok", "", FlowNodeKind::NumInput)
                .with_input(0, FlowInput::literal("", Value::Number(0.5))),
            output_to("out2", names::OPACITY, vec![wire("ok", 0)]),
        ])
        .unwrap()
        .build()
        .unwrap();
    let env = TestEnv::new(&scene);

    let outcome = run(&scene, "g", &env);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].node_id, Some(FlowNodeId::from("bad")));
    assert_eq!(outcome.errors[0].kind, CompositionErrorKind::UnknownNodeKind);
    assert_eq!(outcome.writes, vec![(pid(names::OPACITY), Value::Number(0.5))]);
}

#[test]
fn incompatible_edges_report_coercion() {
    let scene = base()
        .layer_graph("l", "g", vec![
            input_of("tint", "Tint", &[ValueType::Rgba]),
            FlowNode::new("rad", "", FlowNodeKind::DegToRad).with_input(0, wire("tint", 0)),
            output_to("out", names::ROTATION, vec![wire("rad", 0)]),
        ])
        .unwrap()
        .build()
        .unwrap();
    let env = TestEnv::new(&scene);

    let outcome = run(&scene, "g", &env);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].node_id, Some(FlowNodeId::from("rad")));
    assert_eq!(outcome.errors[0].kind, CompositionErrorKind::Coercion {
        input: 0,
        from: ValueType::Rgba,
        to: ValueType::Number,
    });
}

#[test]
fn out_of_range_output_index_is_missing_output() {
    let scene = base()
        .layer_graph("l", "g", vec![
            input_of("angle", "Angle", &[ValueType::Number]),
            output_to("out", names::ROTATION, vec![wire("angle", 3)]),
        ])
        .unwrap()
        .build()
        .unwrap();
    let env = TestEnv::new(&scene);

    let outcome = run(&scene, "g", &env);
    assert_eq!(outcome.errors.len(), 1);
    assert!(matches!(
        outcome.errors[0].kind,
        CompositionErrorKind::MissingOutput { output_index: 3, .. }
    ));
}

#[test]
fn frame_dependence_follows_edges() {
    let scene = base()
        .layer_graph("l", "g", vec![
            FlowNode::new("clock", "", FlowNodeKind::Composition {
                composition_id: None,
            }),
            output_to("out", names::ROTATION, vec![wire("clock", 0)]),
            input_of("angle", "Angle", &[ValueType::Number]),
            output_to("out2", names::OPACITY, vec![wire("angle", 0)]),
        ])
        .unwrap()
        .build()
        .unwrap();
    let env = TestEnv::new(&scene);

    let outcome = run(&scene, "g", &env);
    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    let finals = outcome.final_writes();
    assert_eq!(finals[&pid(names::ROTATION)], &Value::Number(12.0));
    assert!(outcome.frame_dependent.contains(&pid(names::ROTATION)));
    assert!(!outcome.frame_dependent.contains(&pid(names::OPACITY)));

    let mut env = TestEnv::new(&scene);
    env.frame_dependent.insert(pid("Angle"));
    let outcome = run(&scene, "g", &env);
    assert!(outcome.frame_dependent.contains(&pid(names::OPACITY)));
}

#[test]
fn expression_nodes_bind_named_slots() {
    let expr = FlowNode::new("e", "", FlowNodeKind::Expr {
        expression: "half = angle / 2\nboth = [half, angle]".to_owned(),
    })
    .with_input(0, FlowInput::connected("angle", ValueType::Number, "angle", 0))
    .with_output(FlowOutput::new("half", ValueType::Number))
    .with_output(FlowOutput::new("both", ValueType::Vec2));
    let scene = base()
        .layer_graph("l", "g", vec![
            input_of("angle", "Angle", &[ValueType::Number]),
            expr,
            output_to("rot", names::ROTATION, vec![wire("e", 0)]),
            output_to("pos", names::POSITION, vec![wire("e", 0), wire("angle", 0)]),
        ])
        .unwrap()
        .build()
        .unwrap();
    let env = TestEnv::new(&scene);

    let outcome = run(&scene, "g", &env);
    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    assert_eq!(outcome.node_outputs[&FlowNodeId::from("e")], vec![
        Value::Number(90.0),
        Value::Vec2(Vec2::new(90.0, 180.0)),
    ]);
    let finals = outcome.final_writes();
    assert_eq!(finals[&pid(names::ROTATION)], &Value::Number(90.0));
    assert_eq!(finals[&pid(names::POSITION_Y)], &Value::Number(180.0));
}

#[test]
fn unassigned_expression_output_is_an_error() {
    let expr = FlowNode::new("e", "", FlowNodeKind::Expr {
        expression: "x = 1".to_owned(),
    })
    .with_output(FlowOutput::new("y", ValueType::Number));
    let scene = base()
        .layer_graph("l", "g", vec![
            expr,
            output_to("rot", names::ROTATION, vec![wire("e", 0)]),
        ])
        .unwrap()
        .build()
        .unwrap();
    let env = TestEnv::new(&scene);

    let outcome = run(&scene, "g", &env);
    assert_eq!(outcome.errors.len(), 1);
    assert!(matches!(outcome.errors[0].kind, CompositionErrorKind::Expression { .. }));
}

#[test]
fn array_modifier_graphs_evaluate_every_node() {
    let (b, n) = base()
        .array_modifier("l", 4, TransformBehavior::Recursive, OriginBehavior::Relative)
        .unwrap();
    let rotation = array_modifier_property_id("l", n, names::ROTATION);
    let out = FlowNode::new("out", "", FlowNodeKind::PropertyOutput {
        property_id: rotation.clone(),
    })
    .with_input(0, wire("times", 0));
    let scene = b
        .array_modifier_graph(&array_modifier_id("l", n), "am", vec![
            FlowNode::new("i", "", FlowNodeKind::ArrayModifierIndex),
            FlowNode::new("times", "", FlowNodeKind::NumMultiply)
                .with_input(0, wire("i", 0))
                .with_input(1, FlowInput::literal("", Value::Number(10.0))),
            out,
            FlowNode::new("lonely", "", FlowNodeKind::RadToDeg),
        ])
        .unwrap()
        .build()
        .unwrap();
    let mut env = TestEnv::new(&scene);
    env.index = Some(2);

    let outcome = run(&scene, "am", &env);
    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    assert_eq!(outcome.writes, vec![(rotation, Value::Number(20.0))]);
    assert!(outcome.node_outputs.contains_key(&FlowNodeId::from("lonely")));
}

#[test]
fn graphs_are_scheduled_writers_first() {
    let mut scene = SceneBuilder::new()
        .composition("main", 10, 10, 10)
        .layer("main", "l", LayerKind::Rect)
        .unwrap()
        .layer("main", "m", LayerKind::Rect)
        .unwrap()
        .layer("main", "k", LayerKind::Rect)
        .unwrap()
        .build()
        .unwrap();
    let graph = |scene: &mut Scene, id: &str, layer: &str, reads: &str, writes: &str| {
        let read = FlowNode::new(format!("{id}.in"), id, FlowNodeKind::PropertyInput {
            property_id: layer_property_id(reads, names::ROTATION),
        })
        .with_output(FlowOutput::new("", ValueType::Number));
        let write = FlowNode::new(format!("{id}.out"), id, FlowNodeKind::PropertyOutput {
            property_id: layer_property_id(writes, names::ROTATION),
        })
        .with_input(0, wire(&format!("{id}.in"), 0));
        scene.flow_graphs.insert(id.into(), FlowGraph {
            id: id.into(),
            kind: FlowGraphKind::Layer {
                layer_id: layer.into(),
            },
            nodes: vec![read.id.clone(), write.id.clone()],
        });
        scene.flow_nodes.insert(read.id.clone(), read);
        scene.flow_nodes.insert(write.id.clone(), write);
    };
    graph(&mut scene, "b_reader", "m", "l", "m");
    graph(&mut scene, "a_writer", "l", "l", "l");
    graph(&mut scene, "c_free", "k", "k", "k");

    let graphs: Vec<&FlowGraph> = scene.flow_graphs.values().collect();
    let schedule = schedule_graphs(&scene, &graphs);
    assert_eq!(schedule.waves, vec![
        vec![FlowGraphId::from("a_writer"), FlowGraphId::from("c_free")],
        vec![FlowGraphId::from("b_reader")],
    ]);
    assert!(schedule.cyclic.is_empty());

    graph(&mut scene, "a_writer", "l", "m", "l");
    let graphs: Vec<&FlowGraph> = scene.flow_graphs.values().collect();
    let schedule = schedule_graphs(&scene, &graphs);
    assert_eq!(schedule.cyclic, vec![
        FlowGraphId::from("a_writer"),
        FlowGraphId::from("b_reader"),
    ]);
}

#[test]
fn runaway_expression_is_a_node_error() {
    let source = format!("y = {}1{}", "(".repeat(100_000), ")".repeat(100_000));
    let expr = FlowNode::new("e", "", FlowNodeKind::Expr { expression: source })
        .with_output(FlowOutput::new("y", ValueType::Number));
    let scene = base()
        .layer_graph("l", "g", vec![
            expr,
            output_to("rot", names::ROTATION, vec![wire("e", 0)]),
        ])
        .unwrap()
        .build()
        .unwrap();
    let env = TestEnv::new(&scene);

    let outcome = run(&scene, "g", &env);
    assert_eq!(outcome.errors.len(), 1);
    assert!(matches!(outcome.errors[0].kind, CompositionErrorKind::Expression { .. }));
}

#[test]
fn empty_outcome_has_no_effect() {
    let outcome = GraphOutcome::default();
    assert_eq!(outcome.graph_id, FlowGraphId::default());
    assert!(outcome.final_writes().is_empty());
    assert!(outcome.errors.is_empty());
}
