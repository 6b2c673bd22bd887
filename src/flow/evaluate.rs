use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::flow::compute::compute_node;
use crate::flow::env::FlowEnv;
use crate::flow::error::{CompositionError, CompositionErrorKind};
use crate::flow::graph::{FlowGraph, FlowGraphKind, FlowNode, FlowNodeKind};
use crate::foundation::ids::{FlowGraphId, FlowNodeId, PropertyId};
use crate::scene::model::Scene;
use crate::value::coerce::coerce;
use crate::value::types::{Value, ValueType};

/// Result of evaluating one flow graph once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphOutcome {
    /// Evaluated graph.
    pub graph_id: FlowGraphId,
    /// Outputs of every node that computed successfully.
    pub node_outputs: BTreeMap<FlowNodeId, Vec<Value>>,
    /// Leaf writes in terminal order; a later write to the same leaf wins.
    pub writes: Vec<(PropertyId, Value)>,
    /// Written leaves whose value depends on the frame index.
    pub frame_dependent: BTreeSet<PropertyId>,
    /// Failures, one per failing node.
    pub errors: Vec<CompositionError>,
}

impl GraphOutcome {
    /// Final value written to each leaf.
    pub fn final_writes(&self) -> BTreeMap<&PropertyId, &Value> {
        self.writes.iter().map(|(k, v)| (k, v)).collect()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Gray,
    Black,
}

struct Computed {
    values: Vec<Value>,
    frame_dependent: bool,
}

struct Run<'a> {
    scene: &'a Scene,
    graph: &'a FlowGraph,
    env: &'a dyn FlowEnv,
    marks: HashMap<&'a FlowNodeId, Mark>,
    /// `None` marks a node that failed or is missing.
    results: HashMap<&'a FlowNodeId, Option<Computed>>,
    outcome: GraphOutcome,
}

/// Evaluate `graph` against `env`.
///
/// Each terminal is resolved by a depth-first walk over its producers. Every
/// node runs at most once per call. A node whose producer failed is skipped
/// without a second error; a back edge reports one `Cycle` for the terminal.
#[tracing::instrument(level = "debug", skip_all, fields(graph = %graph.id))]
pub fn evaluate_graph(scene: &Scene, graph: &FlowGraph, env: &dyn FlowEnv) -> GraphOutcome {
    let mut run = Run {
        scene,
        graph,
        env,
        marks: HashMap::new(),
        results: HashMap::new(),
        outcome: GraphOutcome {
            graph_id: graph.id.clone(),
            ..GraphOutcome::default()
        },
    };

    for id in &graph.nodes {
        let Some(node) = scene.flow_nodes.get(id) else {
            run.record(CompositionError::graph(
                &graph.id,
                CompositionErrorKind::MissingNode {
                    node_id: id.clone(),
                },
            ));
            continue;
        };
        let terminal = match graph.kind {
            FlowGraphKind::Layer { .. } => {
                matches!(node.kind, FlowNodeKind::PropertyOutput { .. })
            }
            FlowGraphKind::ArrayModifier { .. } => true,
        };
        if terminal {
            run.visit(id);
        }
    }

    tracing::debug!(
        writes = run.outcome.writes.len(),
        errors = run.outcome.errors.len(),
        "graph evaluated"
    );
    run.outcome
}

impl<'a> Run<'a> {
    fn record(&mut self, err: CompositionError) {
        if self.outcome.errors.contains(&err) {
            return;
        }
        tracing::warn!(error = %err, "flow graph error");
        self.outcome.errors.push(err);
    }

    fn fail(&mut self, node_id: &FlowNodeId, kind: CompositionErrorKind) {
        let err = CompositionError::node(&self.graph.id, node_id, kind);
        self.record(err);
    }

    fn visit(&mut self, terminal: &'a FlowNodeId) {
        if self.marks.contains_key(terminal) {
            return;
        }
        let mut cycle_reported = false;
        let mut stack: Vec<(&'a FlowNodeId, usize)> = vec![(terminal, 0)];
        self.marks.insert(terminal, Mark::Gray);

        while let Some(top) = stack.last_mut() {
            let id = top.0;
            let Some(node) = self.scene.flow_nodes.get(id) else {
                // Dangling target; each consumer reports it.
                stack.pop();
                self.marks.insert(id, Mark::Black);
                self.results.insert(id, None);
                continue;
            };

            let mut next = None;
            let mut back_edge = None;
            while top.1 < node.inputs.len() {
                let input = &node.inputs[top.1];
                top.1 += 1;
                let Some(ptr) = &input.pointer else {
                    continue;
                };
                match self.marks.get(&ptr.node_id) {
                    None => {
                        next = Some(&ptr.node_id);
                        break;
                    }
                    Some(Mark::Gray) => {
                        back_edge = Some(&ptr.node_id);
                    }
                    Some(Mark::Black) => {}
                }
            }

            if let Some(target) = back_edge
                && !cycle_reported
            {
                cycle_reported = true;
                let start = stack.iter().position(|(n, _)| *n == target).unwrap_or(0);
                let nodes = stack[start..].iter().map(|(n, _)| (*n).clone()).collect();
                self.fail(terminal, CompositionErrorKind::Cycle { nodes });
            }

            if let Some(child) = next {
                self.marks.insert(child, Mark::Gray);
                stack.push((child, 0));
                continue;
            }

            stack.pop();
            let computed = self.compute(node);
            if let Some(c) = &computed {
                self.outcome
                    .node_outputs
                    .insert(id.clone(), c.values.clone());
            }
            self.marks.insert(id, Mark::Black);
            self.results.insert(id, computed);
        }
    }

    /// Resolve one connected input. `None` means the producer is unusable.
    fn pulled(
        &mut self,
        node: &FlowNode,
        index: usize,
        target: ValueType,
    ) -> Option<(Value, bool)> {
        let ptr = node.inputs[index].pointer.as_ref()?;
        let produced = match self.results.get(&ptr.node_id) {
            Some(Some(c)) => c,
            // Failed, still on the stack, or missing.
            _ => {
                if !self.scene.flow_nodes.contains_key(&ptr.node_id) {
                    let kind = CompositionErrorKind::MissingNode {
                        node_id: ptr.node_id.clone(),
                    };
                    self.fail(&node.id, kind);
                }
                return None;
            }
        };
        let frame_dependent = produced.frame_dependent;
        let Some(value) = produced.values.get(ptr.output_index) else {
            let kind = CompositionErrorKind::MissingOutput {
                node_id: ptr.node_id.clone(),
                output_index: ptr.output_index,
            };
            self.fail(&node.id, kind);
            return None;
        };
        let from = value.value_type();
        match coerce(from, target, value) {
            Some(v) => Some((v, frame_dependent)),
            None => {
                let kind = CompositionErrorKind::Coercion {
                    input: index,
                    from,
                    to: target,
                };
                self.fail(&node.id, kind);
                None
            }
        }
    }

    fn compute(&mut self, node: &'a FlowNode) -> Option<Computed> {
        if let FlowNodeKind::PropertyOutput { property_id } = &node.kind {
            return self.write_outputs(node, property_id);
        }

        let mut inputs = Vec::with_capacity(node.inputs.len());
        let mut frame_dependent = false;
        let mut ok = true;
        for (i, input) in node.inputs.iter().enumerate() {
            if input.pointer.is_some() {
                match self.pulled(node, i, input.value_type) {
                    Some((v, fd)) => {
                        frame_dependent |= fd;
                        inputs.push(v);
                    }
                    None => ok = false,
                }
                continue;
            }
            let from = input.value.value_type();
            match coerce(from, input.value_type, &input.value) {
                Some(v) => inputs.push(v),
                None => {
                    let kind = CompositionErrorKind::Coercion {
                        input: i,
                        from,
                        to: input.value_type,
                    };
                    self.fail(&node.id, kind);
                    ok = false;
                }
            }
        }
        if !ok {
            return None;
        }

        match compute_node(self.scene, node, &inputs, self.env) {
            Ok(values) => Some(Computed {
                values,
                frame_dependent: frame_dependent || self.own_frame_dependence(node),
            }),
            Err(kind) => {
                self.fail(&node.id, kind);
                None
            }
        }
    }

    fn own_frame_dependence(&self, node: &FlowNode) -> bool {
        match &node.kind {
            FlowNodeKind::Composition { .. } => true,
            FlowNodeKind::PropertyInput { property_id } => self
                .scene
                .leaves(property_id)
                .iter()
                .any(|leaf| self.env.is_frame_dependent(&leaf.id)),
            _ => false,
        }
    }

    /// Write every connected input whose producer succeeded into its target leaf.
    fn write_outputs(&mut self, node: &'a FlowNode, property_id: &PropertyId) -> Option<Computed> {
        let leaves = self.scene.leaves(property_id);
        if leaves.is_empty() {
            let kind = CompositionErrorKind::MissingProperty {
                property_id: property_id.clone(),
            };
            self.fail(&node.id, kind);
            return None;
        }
        if leaves.len() != node.inputs.len() {
            let kind = CompositionErrorKind::shape(format!(
                "property '{property_id}' has {} leaves, node declares {} inputs",
                leaves.len(),
                node.inputs.len()
            ));
            self.fail(&node.id, kind);
            return None;
        }

        let mut any_frame_dependent = false;
        for (i, leaf) in leaves.into_iter().enumerate() {
            if node.inputs[i].pointer.is_none() {
                continue;
            }
            let Some((value, fd)) = self.pulled(node, i, leaf.value_type) else {
                continue;
            };
            if fd {
                self.outcome.frame_dependent.insert(leaf.id.clone());
            }
            any_frame_dependent |= fd;
            self.outcome.writes.push((leaf.id.clone(), value));
        }
        Some(Computed {
            values: Vec::new(),
            frame_dependent: any_frame_dependent,
        })
    }
}
