use std::collections::{BTreeMap, BTreeSet};

use crate::flow::graph::{FlowGraph, FlowGraphKind, FlowNodeKind};
use crate::foundation::ids::{FlowNodeId, LayerId, PropertyId};
use crate::perform::registry::{Performable, PerformableRegistry};
use crate::scene::model::Scene;

/// Direction of the state transition a [`ChangeSet`] came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeDirection {
    /// Do, redo, or playback moving forward.
    #[default]
    Forward,
    /// Undo or scrubbing backwards.
    Backward,
}

/// Entities touched by one state transition.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ChangeSet {
    /// Changed properties, compounds or groups.
    pub properties: Vec<PropertyId>,
    /// Changed flow nodes.
    pub nodes: Vec<FlowNodeId>,
    /// Layers whose own fields changed.
    pub layers: Vec<LayerId>,
    /// Transition direction; recorded, never alters the result.
    pub direction: ChangeDirection,
}

/// Actions one layer needs.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct LayerActions {
    /// Affected layer.
    pub layer_id: LayerId,
    /// Actions to perform; never holds both `UpdateTransform` and `UpdatePosition`.
    pub performables: BTreeSet<Performable>,
}

#[derive(Default)]
struct Collector {
    layers: BTreeMap<LayerId, BTreeSet<Performable>>,
}

impl Collector {
    fn add(&mut self, layer: &LayerId, performable: Performable) {
        self.layers.entry(layer.clone()).or_default().insert(performable);
    }

    fn add_property(&mut self, registry: &PerformableRegistry, id: &PropertyId) {
        match registry.entry(id) {
            Some((layer, entry)) => self.add(layer, entry.performable),
            None => tracing::debug!(property = %id, "change to unregistered property ignored"),
        }
    }

    fn finish(self) -> Vec<LayerActions> {
        self.layers
            .into_iter()
            .map(|(layer_id, mut performables)| {
                if performables.contains(&Performable::UpdateTransform) {
                    performables.remove(&Performable::UpdatePosition);
                }
                LayerActions {
                    layer_id,
                    performables,
                }
            })
            .collect()
    }
}

impl PerformableRegistry {
    /// Actions needed after the entities in `changes` were modified.
    ///
    /// A property maps to its own classification. A flow node maps to the
    /// properties its graph writes, or to `UpdateArrayModifierTransform` for an
    /// array-modifier graph. A layer maps to `{DrawLayer, UpdateTransform}`.
    #[tracing::instrument(
        skip_all,
        fields(
            properties = changes.properties.len(),
            nodes = changes.nodes.len(),
            layers = changes.layers.len(),
            direction = ?changes.direction,
        )
    )]
    pub fn actions_for(&self, scene: &Scene, changes: &ChangeSet) -> Vec<LayerActions> {
        let mut out = Collector::default();
        for id in &changes.properties {
            out.add_property(self, id);
        }
        for node_id in &changes.nodes {
            let Some(graph) = graph_of(scene, node_id) else {
                tracing::debug!(node = %node_id, "change to detached node ignored");
                continue;
            };
            match &graph.kind {
                FlowGraphKind::Layer { .. } => {
                    for target in graph_targets(scene, graph) {
                        out.add_property(self, target);
                    }
                }
                FlowGraphKind::ArrayModifier { property_id } => {
                    if let Some((layer, _)) = self.entry(property_id) {
                        out.add(layer, Performable::UpdateArrayModifierTransform);
                    }
                }
            }
        }
        for layer in &changes.layers {
            out.add(layer, Performable::DrawLayer);
            out.add(layer, Performable::UpdateTransform);
        }
        out.finish()
    }

    /// Actions needed when only the frame index moved.
    ///
    /// Seeds from every animated leaf plus `frame_dependent`, the graph targets
    /// reported by the last evaluation. Static layers are absent from the result.
    #[tracing::instrument(skip_all, fields(frame_dependent = frame_dependent.len()))]
    pub fn actions_on_frame_index_change(
        &self,
        frame_dependent: &BTreeSet<PropertyId>,
    ) -> Vec<LayerActions> {
        let mut out = Collector::default();
        for layer in self.layers() {
            for (id, entry) in &layer.properties {
                if entry.is_animated || frame_dependent.contains(id) {
                    out.add(&layer.layer_id, entry.performable);
                }
            }
        }
        out.finish()
    }
}

fn graph_of<'a>(scene: &'a Scene, node_id: &FlowNodeId) -> Option<&'a FlowGraph> {
    let node = scene.flow_nodes.get(node_id)?;
    scene
        .flow_graphs
        .get(&node.graph_id)
        .filter(|g| g.nodes.contains(node_id))
}

/// Properties targeted by the `property_output` nodes of `graph`.
fn graph_targets<'a>(scene: &'a Scene, graph: &'a FlowGraph) -> Vec<&'a PropertyId> {
    scene
        .graph_nodes(graph)
        .filter_map(|n| match &n.kind {
            FlowNodeKind::PropertyOutput { property_id } => Some(property_id),
            _ => None,
        })
        .collect()
}
