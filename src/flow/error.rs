use std::fmt;

use crate::foundation::ids::{FlowGraphId, FlowNodeId, PropertyId};
use crate::value::types::ValueType;

/// Recoverable failure recorded while evaluating a flow graph.
///
/// These never abort a frame: they accumulate in [`crate::FrameOutput::errors`] and the affected
/// properties keep their raw value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompositionError {
    /// Graph the failure happened in.
    pub graph_id: FlowGraphId,
    /// Failing node; `None` for graph-level failures.
    pub node_id: Option<FlowNodeId>,
    /// What went wrong.
    pub kind: CompositionErrorKind,
}

impl CompositionError {
    pub(crate) fn node(
        graph_id: &FlowGraphId,
        node_id: &FlowNodeId,
        kind: CompositionErrorKind,
    ) -> Self {
        Self {
            graph_id: graph_id.clone(),
            node_id: Some(node_id.clone()),
            kind,
        }
    }

    pub(crate) fn graph(graph_id: &FlowGraphId, kind: CompositionErrorKind) -> Self {
        Self {
            graph_id: graph_id.clone(),
            node_id: None,
            kind,
        }
    }
}

impl fmt::Display for CompositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node_id {
            Some(node) => write!(f, "graph '{}' node '{}': {}", self.graph_id, node, self.kind),
            None => write!(f, "graph '{}': {}", self.graph_id, self.kind),
        }
    }
}

impl std::error::Error for CompositionError {}

/// Failure taxonomy for [`CompositionError`].
#[derive(thiserror::Error, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompositionErrorKind {
    /// A value could not be converted across an edge.
    #[error("input {input}: cannot coerce {from:?} to {to:?}")]
    Coercion {
        /// Consumer input index.
        input: usize,
        /// Producer output type.
        from: ValueType,
        /// Consumer input type.
        to: ValueType,
    },
    /// An `expr` node failed to parse, run, or produce its outputs.
    #[error("expression failed: {message}")]
    Expression {
        /// Evaluator message.
        message: String,
    },
    /// The node's kind is not known to this build.
    #[error("unknown node kind")]
    UnknownNodeKind,
    /// A pointer or graph member names a node that does not exist.
    #[error("missing node '{node_id}'")]
    MissingNode {
        /// The dangling id.
        node_id: FlowNodeId,
    },
    /// A pointer names an output index the producer does not have.
    #[error("node '{node_id}' has no output {output_index}")]
    MissingOutput {
        /// Producer node.
        node_id: FlowNodeId,
        /// Requested output.
        output_index: usize,
    },
    /// A property node reads or writes a property that is not in the frame.
    #[error("unknown property '{property_id}'")]
    MissingProperty {
        /// The dangling id.
        property_id: PropertyId,
    },
    /// Inputs or outputs do not have the arity or types the kind needs.
    #[error("shape mismatch: {message}")]
    Shape {
        /// Details.
        message: String,
    },
    /// The node graph contains a cycle reachable from this terminal.
    #[error("cycle through {nodes:?}")]
    Cycle {
        /// Nodes on the cycle, in traversal order.
        nodes: Vec<FlowNodeId>,
    },
    /// The graph reads and writes properties in a loop with other graphs.
    #[error("graph dependency cycle with {graphs:?}")]
    GraphCycle {
        /// Graphs caught in the loop.
        graphs: Vec<FlowGraphId>,
    },
}

impl CompositionErrorKind {
    pub(crate) fn shape(message: impl Into<String>) -> Self {
        Self::Shape {
            message: message.into(),
        }
    }
}
