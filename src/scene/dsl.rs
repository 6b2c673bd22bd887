use crate::animation::keyframe::Timeline;
use crate::flow::graph::{FlowGraph, FlowGraphKind, FlowNode};
use crate::foundation::error::{PropelError, PropelResult};
use crate::foundation::ids::{CompositionId, FlowGraphId, LayerId, PropertyId};
use crate::scene::model::{
    Composition, CompoundProperty, Layer, LayerKind, Property, PropertyGroup, PropertyNode, Scene,
};
use crate::scene::names;
use crate::value::types::{OriginBehavior, TransformBehavior, Value, ValueType};

/// Id of a leaf or group built by [`SceneBuilder`] directly under a layer: `"{layer}/{name}"`.
pub fn layer_property_id(layer: &str, name: &str) -> PropertyId {
    PropertyId(format!("{layer}/{name}"))
}

/// Id of the `n`-th array modifier group of a layer: `"{layer}/am{n}"`.
pub fn array_modifier_id(layer: &str, n: usize) -> PropertyId {
    PropertyId(format!("{layer}/am{n}"))
}

/// Id of a leaf or group inside the `n`-th array modifier: `"{layer}/am{n}/{name}"`.
pub fn array_modifier_property_id(layer: &str, n: usize, name: &str) -> PropertyId {
    PropertyId(format!("{layer}/am{n}/{name}"))
}

/// Builder for [`Scene`] snapshots with the standard property layout.
///
/// Every layer gets a `Transform` group (`Anchor`, `Position`, `Scale` compounds plus `Rotation`
/// and `Opacity`) and a `Content` group for free-form properties.
#[derive(Debug, Default)]
pub struct SceneBuilder {
    scene: Scene,
}

impl SceneBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a composition.
    pub fn composition(mut self, id: &str, width: u32, height: u32, length: u32) -> Self {
        let id = CompositionId::from(id);
        self.scene.compositions.insert(
            id.clone(),
            Composition {
                id,
                name: String::new(),
                layers: Vec::new(),
                length,
                width,
                height,
                frame_index: 0,
            },
        );
        self
    }

    /// Append a layer to `composition` with default transform values.
    pub fn layer(mut self, composition: &str, id: &str, kind: LayerKind) -> PropelResult<Self> {
        let comp_id = CompositionId::from(composition);
        let layer_id = LayerId::from(id);
        if self.scene.layers.contains_key(&layer_id) {
            return Err(PropelError::validation(format!("duplicate layer id '{id}'")));
        }
        let comp = self.scene.compositions.get_mut(&comp_id).ok_or_else(|| {
            PropelError::validation(format!("unknown composition '{composition}'"))
        })?;
        comp.layers.push(layer_id.clone());

        let mut transform = Vec::new();
        for (compound, (x_name, x), (y_name, y)) in [
            (names::ANCHOR, (names::ANCHOR_X, 0.0), (names::ANCHOR_Y, 0.0)),
            (names::POSITION, (names::POSITION_X, 0.0), (names::POSITION_Y, 0.0)),
            (names::SCALE, (names::SCALE_X, 1.0), (names::SCALE_Y, 1.0)),
        ] {
            let xs = self.leaf(id, layer_property_id(id, x_name), x_name, x.into());
            let ys = self.leaf(id, layer_property_id(id, y_name), y_name, y.into());
            let cid = layer_property_id(id, compound);
            transform.push(self.compound(id, cid, compound, vec![xs, ys]));
        }
        for (name, v) in [(names::ROTATION, 0.0), (names::OPACITY, 1.0)] {
            transform.push(self.leaf(id, layer_property_id(id, name), name, v.into()));
        }
        let tid = layer_property_id(id, names::TRANSFORM);
        let transform = self.group(id, tid, names::TRANSFORM, transform);
        let content = self.group(id, layer_property_id(id, "Content"), "Content", Vec::new());

        self.scene.layers.insert(
            layer_id.clone(),
            Layer {
                id: layer_id,
                composition_id: comp_id,
                name: id.to_owned(),
                kind,
                index: 0,
                properties: vec![transform, content],
                graph_id: None,
            },
        );
        Ok(self)
    }

    /// Set a layer's start frame within its composition.
    pub fn layer_index(mut self, layer: &str, index: i64) -> PropelResult<Self> {
        let layer = self
            .scene
            .layers
            .get_mut(&LayerId::from(layer))
            .ok_or_else(|| PropelError::validation(format!("unknown layer '{layer}'")))?;
        layer.index = index;
        Ok(self)
    }

    /// Add a free-form leaf to the layer's `Content` group; its id is `"{layer}/{name}"`.
    pub fn content_property(mut self, layer: &str, name: &str, value: Value) -> PropelResult<Self> {
        let content = layer_property_id(layer, "Content");
        if !self.scene.properties.contains_key(&content) {
            return Err(PropelError::validation(format!("unknown layer '{layer}'")));
        }
        let leaf = self.leaf(layer, layer_property_id(layer, name), name, value);
        if let Some(PropertyNode::Group(g)) = self.scene.properties.get_mut(&content) {
            g.properties.push(leaf);
        }
        Ok(self)
    }

    /// Replace a leaf's static value.
    pub fn value(mut self, property: &PropertyId, value: Value) -> PropelResult<Self> {
        self.leaf_mut(property)?.value = value;
        Ok(self)
    }

    /// Drive a leaf with a timeline.
    pub fn animate(mut self, property: &PropertyId, timeline: Timeline) -> PropelResult<Self> {
        let tid = timeline.id.clone();
        self.leaf_mut(property)?.timeline_id = Some(tid.clone());
        self.scene.timelines.insert(tid, timeline);
        Ok(self)
    }

    /// Append an array modifier to the layer's `Modifiers` group (created on first use).
    ///
    /// Returns the builder and the new modifier's index `n` for the `array_modifier_*_id`
    /// helpers. The modifier's own transform starts as identity with origin `(0, 0)`.
    pub fn array_modifier(
        mut self,
        layer: &str,
        count: u32,
        policy: TransformBehavior,
        origin_behavior: OriginBehavior,
    ) -> PropelResult<(Self, usize)> {
        let layer_id = LayerId::from(layer);
        if !self.scene.layers.contains_key(&layer_id) {
            return Err(PropelError::validation(format!("unknown layer '{layer}'")));
        }
        let modifiers_id = layer_property_id(layer, names::MODIFIERS);
        if !self.scene.properties.contains_key(&modifiers_id) {
            let id = self.group(layer, modifiers_id.clone(), names::MODIFIERS, Vec::new());
            if let Some(l) = self.scene.layers.get_mut(&layer_id) {
                l.properties.push(id);
            }
        }
        let n = self
            .scene
            .properties
            .get(&modifiers_id)
            .map_or(0, |m| m.children().len());
        let pid = |name: &str| array_modifier_property_id(layer, n, name);

        let count = self.leaf(layer, pid(names::COUNT), names::COUNT, f64::from(count).into());
        let policy = self.leaf(
            layer,
            pid(names::TRANSFORM_BEHAVIOR),
            names::TRANSFORM_BEHAVIOR,
            Value::TransformBehavior(policy),
        );
        let origin_behavior = self.leaf(
            layer,
            pid(names::ORIGIN_BEHAVIOR),
            names::ORIGIN_BEHAVIOR,
            Value::OriginBehavior(origin_behavior),
        );
        let correction = self.leaf(
            layer,
            pid(names::ROTATION_CORRECTION),
            names::ROTATION_CORRECTION,
            0.0.into(),
        );
        let ox = self.leaf(layer, pid(names::ORIGIN_X), names::ORIGIN_X, 0.0.into());
        let oy = self.leaf(layer, pid(names::ORIGIN_Y), names::ORIGIN_Y, 0.0.into());
        let origin = self.compound(layer, pid(names::ORIGIN), names::ORIGIN, vec![ox, oy]);

        let px = self.leaf(layer, pid(names::POSITION_X), names::POSITION_X, 0.0.into());
        let py = self.leaf(layer, pid(names::POSITION_Y), names::POSITION_Y, 0.0.into());
        let position = self.compound(layer, pid(names::POSITION), names::POSITION, vec![px, py]);
        let sx = self.leaf(layer, pid(names::SCALE_X), names::SCALE_X, 1.0.into());
        let sy = self.leaf(layer, pid(names::SCALE_Y), names::SCALE_Y, 1.0.into());
        let scale = self.compound(layer, pid(names::SCALE), names::SCALE, vec![sx, sy]);
        let rotation = self.leaf(layer, pid(names::ROTATION), names::ROTATION, 0.0.into());
        let transform = self.group(
            layer,
            pid(names::TRANSFORM),
            names::TRANSFORM,
            vec![position, rotation, scale],
        );

        let modifier = self.group(
            layer,
            array_modifier_id(layer, n),
            names::ARRAY_MODIFIER,
            vec![count, policy, origin_behavior, correction, origin, transform],
        );
        if let Some(PropertyNode::Group(g)) = self.scene.properties.get_mut(&modifiers_id) {
            g.properties.push(modifier);
        }
        Ok((self, n))
    }

    /// Attach a layer flow graph made of `nodes`.
    pub fn layer_graph(
        mut self,
        layer: &str,
        graph: &str,
        nodes: Vec<FlowNode>,
    ) -> PropelResult<Self> {
        let layer_id = LayerId::from(layer);
        let graph_id = FlowGraphId::from(graph);
        let l = self
            .scene
            .layers
            .get_mut(&layer_id)
            .ok_or_else(|| PropelError::validation(format!("unknown layer '{layer}'")))?;
        l.graph_id = Some(graph_id.clone());
        self.insert_graph(graph_id, FlowGraphKind::Layer { layer_id }, nodes);
        Ok(self)
    }

    /// Attach an array-modifier flow graph to the modifier group `modifier`.
    pub fn array_modifier_graph(
        mut self,
        modifier: &PropertyId,
        graph: &str,
        nodes: Vec<FlowNode>,
    ) -> PropelResult<Self> {
        let graph_id = FlowGraphId::from(graph);
        match self.scene.properties.get_mut(modifier) {
            Some(PropertyNode::Group(g)) if g.name == names::ARRAY_MODIFIER => {
                g.graph_id = Some(graph_id.clone());
            }
            _ => {
                return Err(PropelError::validation(format!(
                    "'{modifier}' is not an array modifier"
                )));
            }
        }
        self.insert_graph(
            graph_id,
            FlowGraphKind::ArrayModifier {
                property_id: modifier.clone(),
            },
            nodes,
        );
        Ok(self)
    }

    /// Validate and return the snapshot.
    pub fn build(self) -> PropelResult<Scene> {
        self.scene.validate()?;
        Ok(self.scene)
    }

    fn insert_graph(&mut self, id: FlowGraphId, kind: FlowGraphKind, nodes: Vec<FlowNode>) {
        let ids = nodes.iter().map(|n| n.id.clone()).collect();
        for mut node in nodes {
            node.graph_id = id.clone();
            self.scene.flow_nodes.insert(node.id.clone(), node);
        }
        self.scene
            .flow_graphs
            .insert(id.clone(), FlowGraph { id, kind, nodes: ids });
    }

    fn leaf_mut(&mut self, id: &PropertyId) -> PropelResult<&mut Property> {
        match self.scene.properties.get_mut(id) {
            Some(PropertyNode::Property(p)) => Ok(p),
            _ => Err(PropelError::validation(format!("'{id}' is not a property"))),
        }
    }

    fn leaf(&mut self, layer: &str, id: PropertyId, name: &str, value: Value) -> PropertyId {
        let value_type: ValueType = value.value_type();
        self.insert(PropertyNode::Property(Property {
            id: id.clone(),
            layer_id: LayerId::from(layer),
            name: name.to_owned(),
            value_type,
            value,
            timeline_id: None,
        }));
        id
    }

    fn compound(
        &mut self,
        layer: &str,
        id: PropertyId,
        name: &str,
        children: Vec<PropertyId>,
    ) -> PropertyId {
        self.insert(PropertyNode::Compound(CompoundProperty {
            id: id.clone(),
            layer_id: LayerId::from(layer),
            name: name.to_owned(),
            properties: children,
        }));
        id
    }

    fn group(
        &mut self,
        layer: &str,
        id: PropertyId,
        name: &str,
        children: Vec<PropertyId>,
    ) -> PropertyId {
        self.insert(PropertyNode::Group(PropertyGroup {
            id: id.clone(),
            layer_id: LayerId::from(layer),
            name: name.to_owned(),
            properties: children,
            collapsed: false,
            graph_id: None,
        }));
        id
    }

    fn insert(&mut self, node: PropertyNode) {
        self.scene.properties.insert(node.id().clone(), node);
    }
}
