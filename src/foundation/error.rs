/// Convenience result type used across propel.
pub type PropelResult<T> = Result<T, PropelError>;

/// Fatal error taxonomy used by engine APIs.
///
/// Recoverable per-node failures (coercion misses, expression errors, graph cycles) are not
/// represented here; they accumulate in [`crate::FrameOutput::errors`] instead.
#[derive(thiserror::Error, Debug)]
pub enum PropelError {
    /// Invalid user-provided or snapshot data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Broken scene-graph structure (missing Transform group, unknown array-modifier policy).
    #[error("structure error: {0}")]
    Structure(String),

    /// Errors while validating or sampling timelines.
    #[error("animation error: {0}")]
    Animation(String),

    /// Errors while evaluating a composition for a frame.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PropelError {
    /// Build a [`PropelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PropelError::Structure`] value.
    pub fn structure(msg: impl Into<String>) -> Self {
        Self::Structure(msg.into())
    }

    /// Build a [`PropelError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`PropelError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`PropelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for scene-graph invariant violations.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structure(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
