use crate::flow::graph::{FlowGraph, FlowNode};
use crate::foundation::error::{PropelError, PropelResult};
use crate::foundation::ids::{CompositionId, FlowGraphId, LayerId, PropertyId};
use crate::scene::model::{Composition, Layer, Property, PropertyGroup, PropertyNode, Scene};
use crate::scene::names;

impl Scene {
    /// Look up a composition; a dangling id is a structural error.
    pub fn composition(&self, id: &CompositionId) -> PropelResult<&Composition> {
        self.compositions
            .get(id)
            .ok_or_else(|| PropelError::structure(format!("unknown composition '{id}'")))
    }

    /// Look up a layer; a dangling id is a structural error.
    pub fn layer(&self, id: &LayerId) -> PropelResult<&Layer> {
        self.layers
            .get(id)
            .ok_or_else(|| PropelError::structure(format!("unknown layer '{id}'")))
    }

    /// Look up a flow graph; a dangling id is a structural error.
    pub fn flow_graph(&self, id: &FlowGraphId) -> PropelResult<&FlowGraph> {
        self.flow_graphs
            .get(id)
            .ok_or_else(|| PropelError::structure(format!("unknown flow graph '{id}'")))
    }

    /// Leaf properties under `id` in depth-first display order (`[id]` for a leaf).
    ///
    /// Dangling child ids are skipped; [`Scene::validate`] reports them.
    pub fn leaves(&self, id: &PropertyId) -> Vec<&Property> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            match self.properties.get(id) {
                Some(PropertyNode::Property(p)) => out.push(p),
                Some(node) => stack.extend(node.children().iter().rev()),
                None => {}
            }
        }
        out
    }

    /// Every leaf property of a layer, in display order.
    pub fn layer_leaves(&self, layer: &Layer) -> Vec<&Property> {
        layer
            .properties
            .iter()
            .flat_map(|id| self.leaves(id))
            .collect()
    }

    /// Direct child of `parent` called `name`.
    pub fn child_named<'a>(
        &'a self,
        parent: &[PropertyId],
        name: &str,
    ) -> Option<&'a PropertyNode> {
        parent
            .iter()
            .filter_map(|id| self.properties.get(id))
            .find(|node| node.name() == name)
    }

    /// Leaf reached from `parent` by following `path` names.
    pub fn leaf_at<'a>(&'a self, parent: &[PropertyId], path: &[&str]) -> Option<&'a Property> {
        let (first, rest) = path.split_first()?;
        let node = self.child_named(parent, first)?;
        if rest.is_empty() {
            return node.as_property();
        }
        self.leaf_at(node.children(), rest)
    }

    /// The layer's `Transform` group. Every layer must have one.
    pub fn transform_group(&self, layer: &Layer) -> PropelResult<&PropertyGroup> {
        self.child_named(&layer.properties, names::TRANSFORM)
            .and_then(PropertyNode::as_group)
            .ok_or_else(|| {
                PropelError::structure(format!("layer '{}' has no Transform group", layer.id))
            })
    }

    /// `ArrayModifier` groups of the layer's `Modifiers` group, in stacking order.
    pub fn array_modifiers(&self, layer: &Layer) -> Vec<&PropertyGroup> {
        let Some(modifiers) = self
            .child_named(&layer.properties, names::MODIFIERS)
            .and_then(PropertyNode::as_group)
        else {
            return Vec::new();
        };
        modifiers
            .properties
            .iter()
            .filter_map(|id| self.properties.get(id))
            .filter_map(PropertyNode::as_group)
            .filter(|g| g.name == names::ARRAY_MODIFIER)
            .collect()
    }

    /// Nodes of `graph` in authoring order; dangling ids are skipped.
    pub fn graph_nodes<'a>(&'a self, graph: &'a FlowGraph) -> impl Iterator<Item = &'a FlowNode> {
        graph.nodes.iter().filter_map(|id| self.flow_nodes.get(id))
    }

    /// The composition a layer of kind `composition` instantiates.
    pub fn nested_composition<'a>(&self, layer: &'a Layer) -> Option<&'a CompositionId> {
        match &layer.kind {
            crate::scene::model::LayerKind::Composition { composition_id } => Some(composition_id),
            _ => None,
        }
    }
}
