//! Edge types for connecting nodes in a workflow graph.

use serde::{Deserialize, Serialize};

use super::NodeId;

/// An edge connecting two nodes in the workflow graph.
///
/// Handles name the input/output ports an edge attaches to. The target
/// handle decides how the source's output lands in the target's
/// aggregated input; the reserved `images` handle accumulates values
/// from multiple parents into a list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source node ID.
    pub source: NodeId,
    /// Target node ID.
    pub target: NodeId,
    /// Optional port name on the source node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// Optional port name on the target node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Edge {
    /// Creates a new edge between two nodes.
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            target,
            source_handle: None,
            target_handle: None,
        }
    }

    /// Sets the target handle.
    pub fn with_target_handle(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }

    /// Sets the source handle.
    pub fn with_source_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    /// Returns whether the edge connects a node to itself.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}
