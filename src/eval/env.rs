use std::collections::{BTreeMap, BTreeSet};

use crate::expression::ExpressionEvaluator;
use crate::flow::{CompositionInfo, FlowEnv};
use crate::foundation::core::Vec2;
use crate::foundation::ids::{CompositionId, PropertyId};
use crate::scene::model::{PropertyNode, Scene};
use crate::value::types::Value;

/// Read-only view of one composition's value table during graph evaluation.
#[derive(Clone, Copy)]
pub(crate) struct FrameEnv<'a> {
    pub(crate) scene: &'a Scene,
    pub(crate) composition: &'a CompositionId,
    pub(crate) frames: &'a BTreeMap<CompositionId, f64>,
    pub(crate) values: &'a BTreeMap<PropertyId, Value>,
    pub(crate) frame_dependent: &'a BTreeSet<PropertyId>,
    pub(crate) array_index: Option<usize>,
    pub(crate) expressions: &'a dyn ExpressionEvaluator,
}

impl FrameEnv<'_> {
    /// Same view as seen by array-modifier instance `index`.
    pub(crate) fn for_index(self, index: usize) -> Self {
        Self {
            array_index: Some(index),
            ..self
        }
    }
}

impl FlowEnv for FrameEnv<'_> {
    fn value(&self, property: &PropertyId) -> Option<Value> {
        self.values.get(property).cloned()
    }

    fn is_frame_dependent(&self, property: &PropertyId) -> bool {
        self.frame_dependent.contains(property)
            || matches!(
                self.scene.properties.get(property),
                Some(PropertyNode::Property(p)) if p.is_animated()
            )
    }

    fn array_index(&self) -> Option<usize> {
        self.array_index
    }

    fn composition(&self, id: Option<&CompositionId>) -> Option<CompositionInfo> {
        let id = id.unwrap_or(self.composition);
        let comp = self.scene.compositions.get(id)?;
        let frame_index = self
            .frames
            .get(id)
            .copied()
            .unwrap_or(comp.frame_index as f64);
        Some(CompositionInfo {
            frame_index,
            length: comp.length,
            size: Vec2::new(f64::from(comp.width), f64::from(comp.height)),
        })
    }

    fn expressions(&self) -> &dyn ExpressionEvaluator {
        self.expressions
    }
}
