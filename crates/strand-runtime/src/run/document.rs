//! Polling read model for run observation.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{ExecutionStatus, NodeExecution, RunId, RunStatus, WorkflowRun};
use crate::graph::NodeId;

/// The run-status document a client polls (or receives over a stream).
///
/// Assembled from the store on every read; the engine's contract is
/// only that each persisted transition is visible to the next read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDocument {
    /// Run identifier.
    pub id: RunId,
    /// Current run status.
    pub status: RunStatus,
    /// When execution started.
    pub started_at: Option<Timestamp>,
    /// When execution reached a terminal state.
    pub completed_at: Option<Timestamp>,
    /// Per-node execution state, in row-creation order.
    pub node_executions: Vec<NodeExecutionView>,
}

/// Per-node slice of the run document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecutionView {
    /// The node this entry tracks.
    pub node_id: NodeId,
    /// Current execution status.
    pub status: ExecutionStatus,
    /// Node output, present once completed.
    pub outputs: Option<serde_json::Value>,
    /// Error message, present iff failed.
    pub error: Option<String>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: Option<i64>,
    /// When the node started executing.
    pub started_at: Option<Timestamp>,
    /// When the node settled.
    pub completed_at: Option<Timestamp>,
}

impl From<NodeExecution> for NodeExecutionView {
    fn from(execution: NodeExecution) -> Self {
        Self {
            node_id: execution.node_id,
            status: execution.status,
            outputs: execution.outputs,
            error: execution.error,
            duration_ms: execution.duration_ms,
            started_at: execution.started_at,
            completed_at: execution.completed_at,
        }
    }
}

impl RunDocument {
    /// Assembles the document from a run and its execution rows.
    pub fn assemble(run: WorkflowRun, executions: Vec<NodeExecution>) -> Self {
        Self {
            id: run.id,
            status: run.status,
            started_at: run.started_at,
            completed_at: run.completed_at,
            node_executions: executions.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the view for a specific node, if present.
    pub fn node(&self, node_id: NodeId) -> Option<&NodeExecutionView> {
        self.node_executions
            .iter()
            .find(|view| view.node_id == node_id)
    }
}
