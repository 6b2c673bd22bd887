//! Classify property changes into renderer actions.
//!
//! [`PerformableRegistry`] is built from the structure of each layer's
//! property tree. Queries turn a [`ChangeSet`] (or a frame tick) into the set
//! of [`Performable`]s each affected layer needs.

pub(crate) mod actions;
pub(crate) mod fingerprint;
pub(crate) mod registry;

pub use actions::{ChangeDirection, ChangeSet, LayerActions};
pub use fingerprint::LayerFingerprint;
pub use registry::{
    LayerRegistry, Performable, PerformableRegistry, PropertyEntry, build_layer_registry,
};

#[cfg(test)]
#[path = "../../tests/unit/perform/mod.rs"]
mod tests;
