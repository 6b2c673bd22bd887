//! User-authored node graphs.
//!
//! A graph is evaluated on demand from its terminals: every `property_output`
//! node for layer graphs, every node for array-modifier graphs. Producers are
//! resolved depth-first, values are coerced across each edge, and failures are
//! collected as [`CompositionError`]s instead of aborting the frame.

pub(crate) mod compute;
pub(crate) mod env;
pub(crate) mod error;
pub(crate) mod evaluate;
pub(crate) mod graph;
pub(crate) mod schedule;

pub use env::{CompositionInfo, FlowEnv};
pub use error::{CompositionError, CompositionErrorKind};
pub use evaluate::{GraphOutcome, evaluate_graph};
pub use graph::{
    FlowGraph, FlowGraphKind, FlowInput, FlowNode, FlowNodeKind, FlowOutput, FlowPointer,
};

#[cfg(test)]
#[path = "../../tests/unit/flow/mod.rs"]
mod tests;
