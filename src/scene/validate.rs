use std::collections::BTreeSet;
use std::fmt;

use crate::flow::graph::{FlowGraphKind, FlowNodeKind};
use crate::foundation::error::{PropelError, PropelResult};
use crate::foundation::ids::CompositionId;
use crate::scene::model::{PropertyNode, Scene};
use crate::value::types::ValueType;

#[derive(Debug, Clone)]
pub(crate) struct SceneIssue {
    pub(crate) path: String,
    pub(crate) message: String,
}

impl fmt::Display for SceneIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl Scene {
    /// Check referential integrity and structural invariants of the snapshot.
    ///
    /// All issues are collected and reported together as one [`PropelError::Validation`].
    pub fn validate(&self) -> PropelResult<()> {
        let issues = collect_issues(self);
        if issues.is_empty() {
            return Ok(());
        }
        let msg = issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        Err(PropelError::validation(msg))
    }
}

pub(crate) fn collect_issues(scene: &Scene) -> Vec<SceneIssue> {
    let mut issues = Vec::new();
    let mut push = |path: String, message: String| issues.push(SceneIssue { path, message });

    for (key, comp) in &scene.compositions {
        let path = format!("$.compositions.{key}");
        if &comp.id != key {
            push(path.clone(), format!("id '{}' does not match key", comp.id));
        }
        for layer_id in &comp.layers {
            match scene.layers.get(layer_id) {
                None => push(path.clone(), format!("unknown layer '{layer_id}'")),
                Some(layer) if &layer.composition_id != key => push(
                    path.clone(),
                    format!("layer '{layer_id}' belongs to '{}'", layer.composition_id),
                ),
                Some(_) => {}
            }
        }
    }

    for (key, layer) in &scene.layers {
        let path = format!("$.layers.{key}");
        if &layer.id != key {
            push(path.clone(), format!("id '{}' does not match key", layer.id));
        }
        if !scene.compositions.contains_key(&layer.composition_id) {
            push(
                path.clone(),
                format!("unknown composition '{}'", layer.composition_id),
            );
        }
        if let Some(nested) = scene.nested_composition(layer)
            && !scene.compositions.contains_key(nested)
        {
            push(path.clone(), format!("unknown nested composition '{nested}'"));
        }
        if scene.transform_group(layer).is_err() {
            push(path.clone(), "missing Transform group".to_owned());
        }
        for pid in &layer.properties {
            if !scene.properties.contains_key(pid) {
                push(path.clone(), format!("unknown property '{pid}'"));
            }
        }
        if let Some(gid) = &layer.graph_id {
            match scene.flow_graphs.get(gid).map(|g| &g.kind) {
                None => push(path.clone(), format!("unknown flow graph '{gid}'")),
                Some(FlowGraphKind::Layer { layer_id }) if layer_id == key => {}
                Some(_) => push(path.clone(), format!("graph '{gid}' is not owned by this layer")),
            }
        }
    }

    for (key, node) in &scene.properties {
        let path = format!("$.properties.{key}");
        if node.id() != key {
            push(path.clone(), format!("id '{}' does not match key", node.id()));
        }
        if !scene.layers.contains_key(node.layer_id()) {
            push(path.clone(), format!("unknown layer '{}'", node.layer_id()));
        }
        for child in node.children() {
            if !scene.properties.contains_key(child) {
                push(path.clone(), format!("unknown child '{child}'"));
            }
        }
        match node {
            PropertyNode::Property(p) => {
                if let Some(tid) = &p.timeline_id {
                    if !scene.timelines.contains_key(tid) {
                        push(path.clone(), format!("unknown timeline '{tid}'"));
                    }
                    if p.value_type != ValueType::Number {
                        push(path.clone(), "only number properties can be animated".to_owned());
                    }
                }
            }
            PropertyNode::Compound(c) => {
                let scalar = c.properties.iter().all(|id| {
                    scene
                        .properties
                        .get(id)
                        .and_then(PropertyNode::as_property)
                        .is_some_and(|p| p.value_type == ValueType::Number)
                });
                if c.properties.len() < 2 || !scalar {
                    push(
                        path.clone(),
                        "compound must hold at least two number properties".to_owned(),
                    );
                }
            }
            PropertyNode::Group(g) => {
                if let Some(gid) = &g.graph_id {
                    match scene.flow_graphs.get(gid).map(|graph| &graph.kind) {
                        Some(FlowGraphKind::ArrayModifier { property_id })
                            if property_id == key => {}
                        _ => push(
                            path.clone(),
                            format!("graph '{gid}' is not owned by this group"),
                        ),
                    }
                }
            }
        }
    }

    for (key, timeline) in &scene.timelines {
        if let Err(e) = timeline.validate() {
            push(format!("$.timelines.{key}"), e.to_string());
        }
    }

    for (key, graph) in &scene.flow_graphs {
        let path = format!("$.flow_graphs.{key}");
        for nid in &graph.nodes {
            match scene.flow_nodes.get(nid) {
                None => push(path.clone(), format!("unknown node '{nid}'")),
                Some(node) if &node.graph_id != key => {
                    push(path.clone(), format!("node '{nid}' belongs to '{}'", node.graph_id))
                }
                Some(_) => {}
            }
        }
    }

    for (key, node) in &scene.flow_nodes {
        let path = format!("$.flow_nodes.{key}");
        if !node.has_canonical_shape() {
            push(
                path.clone(),
                format!("inputs/outputs do not match kind '{}'", node.kind.name()),
            );
        }
        match &node.kind {
            FlowNodeKind::PropertyInput { property_id }
            | FlowNodeKind::PropertyOutput { property_id } => {
                if !scene.properties.contains_key(property_id) {
                    push(path.clone(), format!("unknown target property '{property_id}'"));
                }
            }
            FlowNodeKind::Composition {
                composition_id: Some(cid),
            } if !scene.compositions.contains_key(cid) => {
                push(path.clone(), format!("unknown composition '{cid}'"));
            }
            _ => {}
        }
        for (i, input) in node.inputs.iter().enumerate() {
            if let Some(ptr) = &input.pointer
                && !scene.flow_nodes.contains_key(&ptr.node_id)
            {
                push(path.clone(), format!("input {i} points at unknown node '{}'", ptr.node_id));
            }
        }
    }

    if let Some(cycle) = nesting_cycle(scene) {
        push(
            "$.compositions".to_owned(),
            format!("composition nesting cycle through '{cycle}'"),
        );
    }

    issues
}

/// A composition that (transitively) contains itself, if any.
pub(crate) fn nesting_cycle(scene: &Scene) -> Option<CompositionId> {
    let mut done: BTreeSet<&CompositionId> = BTreeSet::new();
    for root in scene.compositions.keys() {
        let mut on_path: Vec<&CompositionId> = Vec::new();
        if let Some(c) = visit_nesting(scene, root, &mut on_path, &mut done) {
            return Some(c.clone());
        }
    }
    None
}

fn visit_nesting<'a>(
    scene: &'a Scene,
    comp: &'a CompositionId,
    on_path: &mut Vec<&'a CompositionId>,
    done: &mut BTreeSet<&'a CompositionId>,
) -> Option<&'a CompositionId> {
    if on_path.contains(&comp) {
        return Some(comp);
    }
    if done.contains(comp) {
        return None;
    }
    on_path.push(comp);
    if let Some(c) = scene.compositions.get(comp) {
        for lid in &c.layers {
            let Some(nested) = scene.layers.get(lid).and_then(|l| scene.nested_composition(l))
            else {
                continue;
            };
            if let Some(found) = visit_nesting(scene, nested, on_path, done) {
                return Some(found);
            }
        }
    }
    on_path.pop();
    done.insert(comp);
    None
}
