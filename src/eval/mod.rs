//! Frame evaluation of a composition.
//!
//! [`Evaluator::eval_frame`] resolves raw property values at a frame, runs
//! layer graphs in dependency order, composes layer and array-modifier
//! transforms and recurses into nested compositions.

pub(crate) mod env;
pub(crate) mod evaluator;
pub(crate) mod options;
pub(crate) mod output;
pub(crate) mod time;
pub(crate) mod transform;

pub use evaluator::Evaluator;
pub use options::EvalOptions;
pub use output::{FrameOutput, LayerTransforms, PropertyValue};

#[cfg(test)]
#[path = "../../tests/unit/eval/mod.rs"]
mod tests;
