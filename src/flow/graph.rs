use crate::foundation::ids::{CompositionId, FlowGraphId, FlowNodeId, PropertyId};
use crate::value::types::{Value, ValueType};

/// A user-authored node graph attached to a layer or an array modifier.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FlowGraph {
    /// Graph id.
    pub id: FlowGraphId,
    /// What the graph is attached to.
    pub kind: FlowGraphKind,
    /// Member nodes, in authoring order.
    pub nodes: Vec<FlowNodeId>,
}

/// Owner of a flow graph.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowGraphKind {
    /// Evaluated once per frame; its `property_output` nodes are the terminals.
    Layer {
        /// Owning layer.
        layer_id: crate::foundation::ids::LayerId,
    },
    /// Evaluated once per array-modifier index; every node is a terminal.
    ArrayModifier {
        /// The `ArrayModifier` group that owns the graph.
        property_id: PropertyId,
    },
}

/// Edge from another node's output into an input.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FlowPointer {
    /// Producer node.
    pub node_id: FlowNodeId,
    /// Index into the producer's outputs.
    pub output_index: usize,
}

/// One node input: a literal value, optionally overridden by a pointer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FlowInput {
    /// Name bound in expression scopes.
    #[serde(default)]
    pub name: String,
    /// Declared type.
    pub value_type: ValueType,
    /// Literal value used when no pointer is connected.
    pub value: Value,
    /// Connected producer, if any.
    #[serde(default)]
    pub pointer: Option<FlowPointer>,
}

impl FlowInput {
    /// Unconnected input holding `value`.
    pub fn literal(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value_type: value.value_type(),
            value,
            pointer: None,
        }
    }

    /// Input of `value_type` connected to `node_id`'s output `output_index`.
    pub fn connected(
        name: impl Into<String>,
        value_type: ValueType,
        node_id: impl Into<FlowNodeId>,
        output_index: usize,
    ) -> Self {
        Self {
            name: name.into(),
            value_type,
            value: Value::default_for(value_type),
            pointer: Some(FlowPointer {
                node_id: node_id.into(),
                output_index,
            }),
        }
    }
}

/// One declared node output.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FlowOutput {
    /// Name read back from expression scopes.
    #[serde(default)]
    pub name: String,
    /// Declared type.
    pub value_type: ValueType,
}

impl FlowOutput {
    /// Output called `name` of type `value_type`.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// A node of a [`FlowGraph`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FlowNode {
    /// Node id.
    pub id: FlowNodeId,
    /// Graph the node belongs to.
    pub graph_id: FlowGraphId,
    /// Kind and kind-specific state.
    pub kind: FlowNodeKind,
    /// Ordered inputs.
    #[serde(default)]
    pub inputs: Vec<FlowInput>,
    /// Ordered outputs.
    #[serde(default)]
    pub outputs: Vec<FlowOutput>,
}

/// Node kinds, each carrying its own state.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowNodeKind {
    /// Passes its literal number through.
    NumInput,
    /// Passes its literal color through.
    ColorInput,
    /// Passes its literal rect through.
    RectInput,
    /// Passes its literal vector through.
    Vec2Input,
    /// Reads the resolved value(s) of a property, compound or group.
    PropertyInput {
        /// Property, compound or group read; one output per leaf.
        property_id: PropertyId,
    },
    /// Writes connected inputs to the leaves of a property, compound or group.
    PropertyOutput {
        /// Property, compound or group written; one input per leaf.
        property_id: PropertyId,
    },
    /// Current array-modifier instance index.
    ArrayModifierIndex,
    /// Frame index, length and size of the enclosing composition.
    Composition {
        /// Composition read; defaults to the one being evaluated.
        #[serde(default)]
        composition_id: Option<CompositionId>,
    },
    /// User-authored expression over the node's named inputs and outputs.
    Expr {
        /// Source text.
        expression: String,
    },
    /// Degrees to radians.
    DegToRad,
    /// Radians to degrees.
    RadToDeg,
    /// `value` capped into `[min, max]`.
    NumCap,
    /// `a + (b - a) * t`.
    NumLerp,
    /// `a + b`.
    NumAdd,
    /// `a * b`.
    NumMultiply,
    /// Component-wise vector sum.
    Vec2Add,
    /// Vector interpolation.
    Vec2Lerp,
    /// Vector split into x and y.
    Vec2Factors,
    /// Vector from x and y.
    Vec2FromFactors,
    /// Color split into r, g, b, a.
    ColorToRgbaFactors,
    /// Color from r, g, b, a.
    ColorFromRgbaFactors,
    /// Rect offset by a vector.
    RectTranslate,
    /// Any kind this build does not know.
    #[serde(other)]
    Unknown,
}

use ValueType::{Number as N, Rect as R, Rgba as C, Vec2 as V};

impl FlowNodeKind {
    /// Canonical `(inputs, outputs)` types, or `None` for kinds whose shape is
    /// defined per node (`property_input`, `property_output`, `expr`, unknown).
    pub fn io_types(&self) -> Option<(&'static [ValueType], &'static [ValueType])> {
        let io: (&'static [ValueType], &'static [ValueType]) = match self {
            Self::NumInput => (&[N], &[N]),
            Self::ColorInput => (&[C], &[C]),
            Self::RectInput => (&[R], &[R]),
            Self::Vec2Input => (&[V], &[V]),
            Self::ArrayModifierIndex => (&[], &[N]),
            Self::Composition { .. } => (&[], &[N, N, V]),
            Self::DegToRad | Self::RadToDeg => (&[N], &[N]),
            Self::NumCap => (&[N, N, N], &[N]),
            Self::NumLerp => (&[N, N, N], &[N]),
            Self::NumAdd | Self::NumMultiply => (&[N, N], &[N]),
            Self::Vec2Add => (&[V, V], &[V]),
            Self::Vec2Lerp => (&[V, V, N], &[V]),
            Self::Vec2Factors => (&[V], &[N, N]),
            Self::Vec2FromFactors => (&[N, N], &[V]),
            Self::ColorToRgbaFactors => (&[C], &[N, N, N, N]),
            Self::ColorFromRgbaFactors => (&[N, N, N, N], &[C]),
            Self::RectTranslate => (&[R, V], &[R]),
            Self::PropertyInput { .. }
            | Self::PropertyOutput { .. }
            | Self::Expr { .. }
            | Self::Unknown => return None,
        };
        Some(io)
    }

    /// snake_case tag, as serialized.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NumInput => "num_input",
            Self::ColorInput => "color_input",
            Self::RectInput => "rect_input",
            Self::Vec2Input => "vec2_input",
            Self::PropertyInput { .. } => "property_input",
            Self::PropertyOutput { .. } => "property_output",
            Self::ArrayModifierIndex => "array_modifier_index",
            Self::Composition { .. } => "composition",
            Self::Expr { .. } => "expr",
            Self::DegToRad => "deg_to_rad",
            Self::RadToDeg => "rad_to_deg",
            Self::NumCap => "num_cap",
            Self::NumLerp => "num_lerp",
            Self::NumAdd => "num_add",
            Self::NumMultiply => "num_multiply",
            Self::Vec2Add => "vec2_add",
            Self::Vec2Lerp => "vec2_lerp",
            Self::Vec2Factors => "vec2_factors",
            Self::Vec2FromFactors => "vec2_from_factors",
            Self::ColorToRgbaFactors => "color_to_rgba_factors",
            Self::ColorFromRgbaFactors => "color_from_rgba_factors",
            Self::RectTranslate => "rect_translate",
            Self::Unknown => "unknown",
        }
    }
}

impl FlowNode {
    /// Node with canonical unconnected inputs and unnamed outputs for `kind`.
    ///
    /// Dynamic kinds start with no inputs or outputs.
    pub fn new(
        id: impl Into<FlowNodeId>,
        graph_id: impl Into<FlowGraphId>,
        kind: FlowNodeKind,
    ) -> Self {
        let (inputs, outputs) = match kind.io_types() {
            Some((ins, outs)) => (
                ins.iter()
                    .map(|&t| FlowInput {
                        name: String::new(),
                        value_type: t,
                        value: Value::default_for(t),
                        pointer: None,
                    })
                    .collect(),
                outs.iter().map(|&t| FlowOutput::new("", t)).collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        Self {
            id: id.into(),
            graph_id: graph_id.into(),
            kind,
            inputs,
            outputs,
        }
    }

    /// Builder-style input override.
    pub fn with_input(mut self, index: usize, input: FlowInput) -> Self {
        if index < self.inputs.len() {
            self.inputs[index] = input;
        } else {
            self.inputs.push(input);
        }
        self
    }

    /// Builder-style output append.
    pub fn with_output(mut self, output: FlowOutput) -> Self {
        self.outputs.push(output);
        self
    }

    /// Producer ids this node reads through pointers, in input order.
    pub fn producers(&self) -> impl Iterator<Item = &FlowNodeId> {
        self.inputs
            .iter()
            .filter_map(|i| i.pointer.as_ref().map(|p| &p.node_id))
    }

    /// `true` when the declared inputs/outputs match [`FlowNodeKind::io_types`].
    pub fn has_canonical_shape(&self) -> bool {
        let Some((ins, outs)) = self.kind.io_types() else {
            return true;
        };
        self.inputs.len() == ins.len()
            && self.outputs.len() == outs.len()
            && self.inputs.iter().zip(ins).all(|(i, t)| i.value_type == *t)
            && self.outputs.iter().zip(outs).all(|(o, t)| o.value_type == *t)
    }
}
