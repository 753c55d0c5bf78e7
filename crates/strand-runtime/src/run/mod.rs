//! Run-scoped records: workflow runs, node executions, and the polling
//! read model.

mod document;
mod id;
mod record;
mod status;

pub use document::{NodeExecutionView, RunDocument};
pub use id::{ExecutionId, RunId};
pub use record::{
    NewNodeExecution, NewWorkflowRun, NodeExecution, UpdateNodeExecution, UpdateWorkflowRun,
    WorkflowRun,
};
pub use status::{ExecutionStatus, RunStatus};
