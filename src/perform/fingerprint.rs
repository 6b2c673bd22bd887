use xxhash_rust::xxh3::Xxh3;

use crate::flow::graph::{FlowGraph, FlowNodeKind};
use crate::foundation::ids::FlowGraphId;
use crate::scene::model::{Layer, LayerKind, PropertyNode, Scene};

const XXH3_SEED: u64 = 0x5d1f_94c3_a07e_26b1;

/// Structural fingerprint of one layer's property tree and graph wiring.
///
/// Values are not hashed, so editing a static value keeps the fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct LayerFingerprint {
    /// High 64 bits of the digest.
    pub hi: u64,
    /// Low 64 bits of the digest.
    pub lo: u64,
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write_bytes(s.as_bytes());
    }

    fn finish(self) -> LayerFingerprint {
        let v = self.inner.digest128();
        LayerFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

pub(crate) fn fingerprint_layer(scene: &Scene, layer: &Layer) -> LayerFingerprint {
    let mut h = StableHasher::new();
    h.write_str(layer.id.as_str());
    match &layer.kind {
        LayerKind::Rect => h.write_u8(0),
        LayerKind::Ellipse => h.write_u8(1),
        LayerKind::Shape => h.write_u8(2),
        LayerKind::Line => h.write_u8(3),
        LayerKind::Composition { composition_id } => {
            h.write_u8(4);
            h.write_str(composition_id.as_str());
        }
    }
    write_graph_ref(&mut h, scene, layer.graph_id.as_ref());

    // Explicit stack; children are pushed reversed to keep authoring order.
    h.write_u32(layer.properties.len() as u32);
    let mut stack: Vec<_> = layer.properties.iter().rev().collect();
    while let Some(id) = stack.pop() {
        h.write_str(id.as_str());
        let Some(node) = scene.properties.get(id) else {
            h.write_u8(0xff);
            continue;
        };
        h.write_str(node.name());
        match node {
            PropertyNode::Property(p) => {
                h.write_u8(0);
                h.write_u8(p.value_type as u8);
                h.write_bool(p.timeline_id.is_some());
            }
            PropertyNode::Compound(_) => h.write_u8(1),
            PropertyNode::Group(g) => {
                h.write_u8(2);
                write_graph_ref(&mut h, scene, g.graph_id.as_ref());
            }
        }
        let children = node.children();
        h.write_u32(children.len() as u32);
        stack.extend(children.iter().rev());
    }
    h.finish()
}

fn write_graph_ref(h: &mut StableHasher, scene: &Scene, graph_id: Option<&FlowGraphId>) {
    let Some(graph_id) = graph_id else {
        h.write_u8(0);
        return;
    };
    h.write_u8(1);
    h.write_str(graph_id.as_str());
    match scene.flow_graphs.get(graph_id) {
        Some(graph) => write_graph(h, scene, graph),
        None => h.write_u8(0xff),
    }
}

fn write_graph(h: &mut StableHasher, scene: &Scene, graph: &FlowGraph) {
    h.write_u32(graph.nodes.len() as u32);
    for node_id in &graph.nodes {
        h.write_str(node_id.as_str());
        let Some(node) = scene.flow_nodes.get(node_id) else {
            h.write_u8(0xff);
            continue;
        };
        h.write_str(node.kind.name());
        match &node.kind {
            FlowNodeKind::PropertyInput { property_id }
            | FlowNodeKind::PropertyOutput { property_id } => h.write_str(property_id.as_str()),
            _ => {}
        }
        h.write_u32(node.inputs.len() as u32);
        for input in &node.inputs {
            match &input.pointer {
                Some(p) => {
                    h.write_u8(1);
                    h.write_str(p.node_id.as_str());
                    h.write_u64(p.output_index as u64);
                }
                None => h.write_u8(0),
            }
        }
        h.write_u32(node.outputs.len() as u32);
    }
}
