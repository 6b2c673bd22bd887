use std::collections::BTreeMap;

use crate::animation::keyframe::Timeline;
use crate::flow::graph::{FlowGraph, FlowNode};
use crate::foundation::ids::{
    CompositionId, FlowGraphId, FlowNodeId, LayerId, PropertyId, TimelineId,
};
use crate::value::types::{Value, ValueType};

/// Immutable scene snapshot read by every evaluation.
///
/// Entities live in id-keyed tables; structure is expressed through id lists (a layer's
/// top-level properties, a group's children). The engine never mutates a snapshot.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    /// Compositions by id.
    #[serde(default)]
    pub compositions: BTreeMap<CompositionId, Composition>,
    /// Layers by id.
    #[serde(default)]
    pub layers: BTreeMap<LayerId, Layer>,
    /// Properties, compound properties and groups by id.
    #[serde(default)]
    pub properties: BTreeMap<PropertyId, PropertyNode>,
    /// Keyframe timelines by id.
    #[serde(default)]
    pub timelines: BTreeMap<TimelineId, Timeline>,
    /// Flow graphs by id.
    #[serde(default)]
    pub flow_graphs: BTreeMap<FlowGraphId, FlowGraph>,
    /// Flow nodes by id.
    #[serde(default)]
    pub flow_nodes: BTreeMap<FlowNodeId, FlowNode>,
}

/// A composition: an ordered stack of layers with its own clock.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Composition {
    /// Composition id.
    pub id: CompositionId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Layers, bottom to top.
    #[serde(default)]
    pub layers: Vec<LayerId>,
    /// Length in frames.
    pub length: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Current frame index shown for this composition.
    #[serde(default)]
    pub frame_index: i64,
}

/// What a layer draws.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerKind {
    /// Rectangle shape.
    Rect,
    /// Ellipse shape.
    Ellipse,
    /// Arbitrary path.
    Shape,
    /// Line.
    Line,
    /// Nested composition instance.
    Composition {
        /// The referenced composition.
        composition_id: CompositionId,
    },
}

/// A layer inside a composition.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layer {
    /// Layer id.
    pub id: LayerId,
    /// Owning composition.
    pub composition_id: CompositionId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// What the layer draws.
    pub kind: LayerKind,
    /// Start frame within the owning composition.
    #[serde(default)]
    pub index: i64,
    /// Top-level property nodes (groups such as `Transform` and `Modifiers`).
    #[serde(default)]
    pub properties: Vec<PropertyId>,
    /// Layer flow graph, if any.
    #[serde(default)]
    pub graph_id: Option<FlowGraphId>,
}

/// A single animatable field.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Property {
    /// Property id.
    pub id: PropertyId,
    /// Owning layer.
    pub layer_id: LayerId,
    /// Structural name (see [`crate::scene::names`]).
    pub name: String,
    /// Declared type.
    pub value_type: ValueType,
    /// Static value, used when no timeline is attached.
    pub value: Value,
    /// Keyframe timeline; present iff the property is animated.
    #[serde(default)]
    pub timeline_id: Option<TimelineId>,
}

impl Property {
    /// `true` when the raw value comes from a timeline.
    pub fn is_animated(&self) -> bool {
        self.timeline_id.is_some()
    }
}

/// Ordered, arbitrarily nested group of property nodes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PropertyGroup {
    /// Group id.
    pub id: PropertyId,
    /// Owning layer.
    pub layer_id: LayerId,
    /// Structural name (`Transform`, `Modifiers`, `ArrayModifier`, ...).
    pub name: String,
    /// Children in display order.
    #[serde(default)]
    pub properties: Vec<PropertyId>,
    /// UI collapse state; carried, never read.
    #[serde(default)]
    pub collapsed: bool,
    /// Array-modifier flow graph (only on `ArrayModifier` groups).
    #[serde(default)]
    pub graph_id: Option<FlowGraphId>,
}

/// Scalars forming one semantic vector (`Position = {PositionX, PositionY}`).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompoundProperty {
    /// Compound id.
    pub id: PropertyId,
    /// Owning layer.
    pub layer_id: LayerId,
    /// Structural name.
    pub name: String,
    /// Scalar children, x first.
    pub properties: Vec<PropertyId>,
}

/// Entry of [`Scene::properties`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyNode {
    /// Leaf property.
    Property(Property),
    /// Nested group.
    Group(PropertyGroup),
    /// Compound of scalar properties.
    Compound(CompoundProperty),
}

impl PropertyNode {
    /// Node id.
    pub fn id(&self) -> &PropertyId {
        match self {
            Self::Property(p) => &p.id,
            Self::Group(g) => &g.id,
            Self::Compound(c) => &c.id,
        }
    }

    /// Structural name.
    pub fn name(&self) -> &str {
        match self {
            Self::Property(p) => &p.name,
            Self::Group(g) => &g.name,
            Self::Compound(c) => &c.name,
        }
    }

    /// Owning layer.
    pub fn layer_id(&self) -> &LayerId {
        match self {
            Self::Property(p) => &p.layer_id,
            Self::Group(g) => &g.layer_id,
            Self::Compound(c) => &c.layer_id,
        }
    }

    /// Child ids; empty for leaves.
    pub fn children(&self) -> &[PropertyId] {
        match self {
            Self::Property(_) => &[],
            Self::Group(g) => &g.properties,
            Self::Compound(c) => &c.properties,
        }
    }

    /// The leaf, if this is one.
    pub fn as_property(&self) -> Option<&Property> {
        match self {
            Self::Property(p) => Some(p),
            _ => None,
        }
    }

    /// The group, if this is one.
    pub fn as_group(&self) -> Option<&PropertyGroup> {
        match self {
            Self::Group(g) => Some(g),
            _ => None,
        }
    }
}
