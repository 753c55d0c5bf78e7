//! Run and node-execution records with their changeset types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ExecutionId, ExecutionStatus, RunId, RunStatus};
use crate::graph::{NodeId, WorkflowId};

/// One execution attempt of a workflow (or a scoped node subset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Unique run identifier.
    pub id: RunId,
    /// The workflow this run executes.
    pub workflow_id: WorkflowId,
    /// Account that triggered the run.
    pub account_id: Uuid,
    /// Current execution status.
    pub status: RunStatus,
    /// When execution started.
    pub started_at: Option<Timestamp>,
    /// When execution reached a terminal state.
    pub completed_at: Option<Timestamp>,
    /// When the run was created.
    pub created_at: Timestamp,
}

/// Data for creating a new workflow run.
#[derive(Debug, Clone)]
pub struct NewWorkflowRun {
    /// Run ID, caller-assigned (the enqueue contract carries it).
    pub id: RunId,
    /// Workflow to execute.
    pub workflow_id: WorkflowId,
    /// Triggering account.
    pub account_id: Uuid,
}

impl NewWorkflowRun {
    /// Materializes the record with Pending status.
    pub fn into_record(self, now: Timestamp) -> WorkflowRun {
        WorkflowRun {
            id: self.id,
            workflow_id: self.workflow_id,
            account_id: self.account_id,
            status: RunStatus::Pending,
            started_at: None,
            completed_at: None,
            created_at: now,
        }
    }
}

/// Data for updating a workflow run. Unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateWorkflowRun {
    /// New execution status.
    pub status: Option<RunStatus>,
    /// Start timestamp.
    pub started_at: Option<Timestamp>,
    /// Completion timestamp.
    pub completed_at: Option<Timestamp>,
}

impl UpdateWorkflowRun {
    /// Changeset marking the run as started.
    pub fn started(now: Timestamp) -> Self {
        Self {
            status: Some(RunStatus::Running),
            started_at: Some(now),
            ..Default::default()
        }
    }

    /// Changeset marking the run as finished with the given status.
    pub fn finished(status: RunStatus, now: Timestamp) -> Self {
        Self {
            status: Some(status),
            completed_at: Some(now),
            ..Default::default()
        }
    }

    /// Applies this changeset to a record.
    pub fn apply(&self, run: &mut WorkflowRun) {
        if let Some(status) = self.status {
            run.status = status;
        }
        if let Some(started_at) = self.started_at {
            run.started_at = Some(started_at);
        }
        if let Some(completed_at) = self.completed_at {
            run.completed_at = Some(completed_at);
        }
    }
}

/// The per-run, per-node record of execution state.
///
/// One row per (run, node) pair in the run's scope; never reused across
/// runs. Mutated twice on the happy path (→Running, →Completed) and
/// twice on the failure path (→Running, →Failed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecution {
    /// Unique row identifier.
    pub id: ExecutionId,
    /// The run this execution belongs to.
    pub run_id: RunId,
    /// The node this execution tracks.
    pub node_id: NodeId,
    /// Current execution status.
    pub status: ExecutionStatus,
    /// Snapshot of the aggregated input fed to the node.
    pub inputs: Option<serde_json::Value>,
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
    /// When the row was created.
    pub created_at: Timestamp,
}

/// Data for creating a new node execution row.
#[derive(Debug, Clone)]
pub struct NewNodeExecution {
    /// The owning run.
    pub run_id: RunId,
    /// The node to track.
    pub node_id: NodeId,
}

impl NewNodeExecution {
    /// Materializes the record with Pending status.
    pub fn into_record(self, now: Timestamp) -> NodeExecution {
        NodeExecution {
            id: ExecutionId::new(),
            run_id: self.run_id,
            node_id: self.node_id,
            status: ExecutionStatus::Pending,
            inputs: None,
            outputs: None,
            error: None,
            duration_ms: None,
            started_at: None,
            completed_at: None,
            created_at: now,
        }
    }
}

/// Data for updating a node execution. Unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateNodeExecution {
    /// New execution status.
    pub status: Option<ExecutionStatus>,
    /// Aggregated input snapshot.
    pub inputs: Option<serde_json::Value>,
    /// Node output.
    pub outputs: Option<serde_json::Value>,
    /// Error message.
    pub error: Option<String>,
    /// Duration in milliseconds.
    pub duration_ms: Option<i64>,
    /// Start timestamp.
    pub started_at: Option<Timestamp>,
    /// Settlement timestamp.
    pub completed_at: Option<Timestamp>,
}

impl UpdateNodeExecution {
    /// Changeset marking the node as started.
    pub fn started(now: Timestamp) -> Self {
        Self {
            status: Some(ExecutionStatus::Running),
            started_at: Some(now),
            ..Default::default()
        }
    }

    /// Changeset for a successful settlement.
    pub fn completed(
        inputs: serde_json::Value,
        outputs: serde_json::Value,
        duration_ms: i64,
        now: Timestamp,
    ) -> Self {
        Self {
            status: Some(ExecutionStatus::Completed),
            inputs: Some(inputs),
            outputs: Some(outputs),
            duration_ms: Some(duration_ms),
            completed_at: Some(now),
            ..Default::default()
        }
    }

    /// Changeset for a failed settlement.
    pub fn failed(
        inputs: Option<serde_json::Value>,
        error: impl Into<String>,
        duration_ms: i64,
        now: Timestamp,
    ) -> Self {
        Self {
            status: Some(ExecutionStatus::Failed),
            inputs,
            error: Some(error.into()),
            duration_ms: Some(duration_ms),
            completed_at: Some(now),
            ..Default::default()
        }
    }

    /// Changeset marking the node as skipped.
    pub fn skipped(now: Timestamp) -> Self {
        Self {
            status: Some(ExecutionStatus::Skipped),
            completed_at: Some(now),
            ..Default::default()
        }
    }

    /// Applies this changeset to a record.
    pub fn apply(&self, execution: &mut NodeExecution) {
        if let Some(status) = self.status {
            execution.status = status;
        }
        if let Some(ref inputs) = self.inputs {
            execution.inputs = Some(inputs.clone());
        }
        if let Some(ref outputs) = self.outputs {
            execution.outputs = Some(outputs.clone());
        }
        if let Some(ref error) = self.error {
            execution.error = Some(error.clone());
        }
        if let Some(duration_ms) = self.duration_ms {
            execution.duration_ms = Some(duration_ms);
        }
        if let Some(started_at) = self.started_at {
            execution.started_at = Some(started_at);
        }
        if let Some(completed_at) = self.completed_at {
            execution.completed_at = Some(completed_at);
        }
    }
}
