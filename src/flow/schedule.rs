use std::collections::{BTreeMap, BTreeSet};

use crate::flow::graph::{FlowGraph, FlowNodeKind};
use crate::foundation::ids::{FlowGraphId, PropertyId};
use crate::scene::model::Scene;

/// Evaluation order for a set of graphs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct GraphSchedule {
    /// Dependency waves; graphs within a wave are independent.
    pub(crate) waves: Vec<Vec<FlowGraphId>>,
    /// Graphs caught in a read/write loop, run last in id order.
    pub(crate) cyclic: Vec<FlowGraphId>,
}

/// Leaves a graph reads through `property_input` nodes.
pub(crate) fn graph_reads(scene: &Scene, graph: &FlowGraph) -> BTreeSet<PropertyId> {
    let mut out = BTreeSet::new();
    for node in scene.graph_nodes(graph) {
        if let FlowNodeKind::PropertyInput { property_id } = &node.kind {
            out.extend(scene.leaves(property_id).into_iter().map(|p| p.id.clone()));
        }
    }
    out
}

/// Leaves a graph writes through connected `property_output` inputs.
pub(crate) fn graph_writes(scene: &Scene, graph: &FlowGraph) -> BTreeSet<PropertyId> {
    let mut out = BTreeSet::new();
    for node in scene.graph_nodes(graph) {
        if let FlowNodeKind::PropertyOutput { property_id } = &node.kind {
            let leaves = scene.leaves(property_id);
            for (leaf, input) in leaves.into_iter().zip(&node.inputs) {
                if input.pointer.is_some() {
                    out.insert(leaf.id.clone());
                }
            }
        }
    }
    out
}

/// Order `graphs` so that a graph writing a leaf runs before every graph reading it.
///
/// Kahn's algorithm; ties break by graph id so the order is stable.
pub(crate) fn schedule_graphs(scene: &Scene, graphs: &[&FlowGraph]) -> GraphSchedule {
    let reads: BTreeMap<&FlowGraphId, BTreeSet<PropertyId>> =
        graphs.iter().map(|g| (&g.id, graph_reads(scene, g))).collect();
    let writes: BTreeMap<&FlowGraphId, BTreeSet<PropertyId>> =
        graphs.iter().map(|g| (&g.id, graph_writes(scene, g))).collect();

    let mut dependents: BTreeMap<&FlowGraphId, Vec<&FlowGraphId>> = BTreeMap::new();
    let mut indegree: BTreeMap<&FlowGraphId, usize> = reads.keys().map(|id| (*id, 0)).collect();
    for (a, w) in &writes {
        for (b, r) in &reads {
            if a != b && !w.is_disjoint(r) {
                dependents.entry(*a).or_default().push(*b);
                *indegree.entry(*b).or_default() += 1;
            }
        }
    }

    let mut schedule = GraphSchedule::default();
    let mut ready: BTreeSet<&FlowGraphId> = indegree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(id, _)| *id)
        .collect();
    while !ready.is_empty() {
        let wave: Vec<&FlowGraphId> = std::mem::take(&mut ready).into_iter().collect();
        for id in &wave {
            indegree.remove(*id);
            for dep in dependents.get(*id).into_iter().flatten() {
                if let Some(d) = indegree.get_mut(*dep) {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert(*dep);
                    }
                }
            }
        }
        schedule.waves.push(wave.into_iter().cloned().collect());
    }

    schedule.cyclic = indegree.into_keys().cloned().collect();
    if !schedule.cyclic.is_empty() {
        tracing::warn!(graphs = ?schedule.cyclic, "flow graphs depend on each other cyclically");
    }
    schedule
}
