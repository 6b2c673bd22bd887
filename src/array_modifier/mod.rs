//! Array modifiers: N transformed instances of one layer.
//!
//! Each index resolves its own step transform (from static values or from the
//! modifier's per-index graph) and [`compose_index_transforms`] accumulates the
//! steps under the modifier's [`TransformBehavior`](crate::TransformBehavior).

pub(crate) mod compose;
pub(crate) mod params;
pub(crate) mod types;

pub use compose::{compose_index_transforms, corrected, place_instances};
pub use types::{ArrayModifierParams, ComposedInstance, ComputedFields, IndexTransform};
