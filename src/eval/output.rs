use std::collections::{BTreeMap, BTreeSet};

use crate::array_modifier::IndexTransform;
use crate::flow::CompositionError;
use crate::foundation::core::Affine;
use crate::foundation::ids::{CompositionId, LayerId, PropertyId};
use crate::value::types::Value;

/// Raw (static or keyframed) and computed (after graphs) value of one leaf.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PropertyValue {
    /// Value before any graph ran.
    pub raw: Value,
    /// Value after every graph write.
    pub computed: Value,
}

/// Resolved placement of one layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct LayerTransforms {
    /// The layer's own transform.
    pub base: Affine,
    /// Layer opacity.
    pub opacity: f64,
    /// One matrix per rendered instance; `[base]` without array modifiers.
    pub transform: Vec<Affine>,
    /// Composed index transforms, one list per array modifier in stacking order.
    pub index_transforms: Vec<Vec<IndexTransform>>,
}

/// Everything resolved for one composition at one frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FrameOutput {
    /// Evaluated composition.
    pub composition_id: CompositionId,
    /// Effective frame index.
    pub frame: f64,
    /// Array-modifier instance of the parent layer this output belongs to.
    pub instance_index: Option<usize>,
    /// Leaves of the composition's own layers.
    pub properties: BTreeMap<PropertyId, PropertyValue>,
    /// Placement of each own layer.
    pub transforms: BTreeMap<LayerId, LayerTransforms>,
    /// Sub-composition outputs per composition layer, one per instance.
    pub composition_layers: BTreeMap<LayerId, Vec<FrameOutput>>,
    /// Leaves whose computed value depends on the frame index through a graph.
    pub frame_dependent: BTreeSet<PropertyId>,
    /// Recoverable graph failures of this composition.
    pub errors: Vec<CompositionError>,
}

impl FrameOutput {
    /// Computed value of a leaf.
    pub fn computed(&self, id: &PropertyId) -> Option<&Value> {
        self.properties.get(id).map(|p| &p.computed)
    }

    /// `true` when this output or any nested one recorded an error.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
            || self
                .composition_layers
                .values()
                .flatten()
                .any(FrameOutput::has_errors)
    }

    /// Errors of this output followed by those of nested outputs, depth first.
    pub fn all_errors(&self) -> Vec<&CompositionError> {
        let mut out: Vec<&CompositionError> = self.errors.iter().collect();
        for sub in self.composition_layers.values().flatten() {
            out.extend(sub.all_errors());
        }
        out
    }
}
