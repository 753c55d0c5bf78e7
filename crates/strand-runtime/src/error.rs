//! Workflow error types.

use thiserror::Error;

use crate::graph::{NodeId, WorkflowId};
use crate::run::RunId;
use crate::store::StoreError;

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Workflow definition is invalid.
    #[error("invalid workflow definition: {0}")]
    InvalidDefinition(String),

    /// An edge references a node that does not exist in the workflow.
    #[error("edge references non-existent node: {0}")]
    MissingNode(NodeId),

    /// The workflow graph contains a cycle.
    #[error("cycle detected in workflow graph")]
    CycleDetected,

    /// A node's aggregated input is missing a required value.
    #[error("invalid input for node {node_id}: {message}")]
    InvalidNodeInput {
        /// ID of the node with invalid input.
        node_id: NodeId,
        /// Error message.
        message: String,
    },

    /// Node execution failed.
    #[error("node {node_id} failed: {message}")]
    NodeFailed {
        /// ID of the failed node.
        node_id: NodeId,
        /// Error message.
        message: String,
    },

    /// The run is already being executed.
    #[error("run {0} is already in flight")]
    RunInFlight(RunId),

    /// The triggering account does not own the workflow or run.
    #[error("workflow {workflow_id} is not owned by account {account_id}")]
    NotOwner {
        /// The workflow the trigger targeted.
        workflow_id: WorkflowId,
        /// The account that attempted the trigger.
        account_id: uuid::Uuid,
    },

    /// Capability service call failed.
    #[error(transparent)]
    Service(#[from] strand_services::ServiceError),

    /// Persistence operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    /// Creates an invalid-input error for a node.
    pub fn invalid_input(node_id: NodeId, message: impl std::fmt::Display) -> Self {
        Self::InvalidNodeInput {
            node_id,
            message: message.to_string(),
        }
    }
}
