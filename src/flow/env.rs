use crate::expression::ExpressionEvaluator;
use crate::foundation::core::Vec2;
use crate::foundation::ids::{CompositionId, PropertyId};
use crate::value::types::Value;

/// Clock and size of a composition, as seen by `composition` nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositionInfo {
    /// Effective frame index.
    pub frame_index: f64,
    /// Length in frames.
    pub length: u32,
    /// Width and height in pixels.
    pub size: Vec2,
}

/// Everything a graph reads from outside its own nodes.
///
/// Shared by every graph of one dependency wave, hence `Sync`.
pub trait FlowEnv: Sync {
    /// Current resolved value of a leaf property.
    fn value(&self, property: &PropertyId) -> Option<Value>;

    /// Whether a leaf's resolved value changes with the frame index.
    fn is_frame_dependent(&self, property: &PropertyId) -> bool;

    /// Array-modifier instance index being evaluated, if any.
    fn array_index(&self) -> Option<usize>;

    /// Clock of `id`, or of the composition being evaluated when `None`.
    fn composition(&self, id: Option<&CompositionId>) -> Option<CompositionInfo>;

    /// Evaluator used by `expr` nodes.
    fn expressions(&self) -> &dyn ExpressionEvaluator;
}
