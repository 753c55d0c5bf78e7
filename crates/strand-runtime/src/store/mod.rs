//! Persistence port for the graph store.
//!
//! The engine never talks to a database directly; it is constructed
//! with an [`RunStore`] implementation. [`MemoryStore`] backs tests and
//! embedded use; a production deployment implements the port over its
//! own storage.

mod memory;

use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;

use crate::graph::{Workflow, WorkflowId};
use crate::run::{
    ExecutionId, NewNodeExecution, NewWorkflowRun, NodeExecution, RunId, UpdateNodeExecution,
    UpdateWorkflowRun, WorkflowRun,
};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the persistence port.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. `"workflow"`.
        entity: &'static str,
        /// Identifier that failed to resolve.
        id: Uuid,
    },

    /// A record with the same identity already exists.
    #[error("{entity} {id} already exists")]
    Conflict {
        /// Entity kind.
        entity: &'static str,
        /// Conflicting identifier.
        id: Uuid,
    },

    /// The backing store rejected or failed the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Creates a not-found error.
    pub fn not_found(entity: &'static str, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(entity: &'static str, id: impl Into<Uuid>) -> Self {
        Self::Conflict {
            entity,
            id: id.into(),
        }
    }

    /// Returns whether this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Durable storage of workflows, runs, and node executions.
///
/// Every write must be visible to the next read: a polling client
/// observes progress through this port while a run is in flight.
#[async_trait::async_trait]
pub trait RunStore: Send + Sync {
    /// Loads a workflow with its nodes and edges.
    async fn get_workflow(&self, id: WorkflowId) -> StoreResult<Workflow>;

    /// Creates a run row in Pending status.
    async fn create_run(&self, new: NewWorkflowRun) -> StoreResult<WorkflowRun>;

    /// Loads a run row.
    async fn get_run(&self, id: RunId) -> StoreResult<WorkflowRun>;

    /// Applies a changeset to a run row.
    async fn update_run(&self, id: RunId, changes: UpdateWorkflowRun) -> StoreResult<WorkflowRun>;

    /// Lists all execution rows of a run, in creation order.
    async fn list_executions(&self, run_id: RunId) -> StoreResult<Vec<NodeExecution>>;

    /// Creates an execution row in Pending status.
    async fn create_execution(&self, new: NewNodeExecution) -> StoreResult<NodeExecution>;

    /// Applies a changeset to an execution row.
    async fn update_execution(
        &self,
        id: ExecutionId,
        changes: UpdateNodeExecution,
    ) -> StoreResult<NodeExecution>;
}
