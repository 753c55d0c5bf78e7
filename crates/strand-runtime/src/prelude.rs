//! Convenience re-exports for embedding the runtime.

pub use crate::engine::{Engine, EngineConfig, RunRequest, RunSummary};
pub use crate::error::{WorkflowError, WorkflowResult};
pub use crate::graph::{Edge, Node, NodeId, NodeKind, Workflow, WorkflowId};
pub use crate::run::{
    ExecutionStatus, NodeExecution, RunDocument, RunId, RunStatus, WorkflowRun,
};
pub use crate::runtime::{RunHandle, RuntimeService};
pub use crate::store::{MemoryStore, RunStore, StoreError};

pub use strand_services::{
    CompletionRequest, CompletionService, CropRequest, FrameRequest, MediaOutput,
    MediaTransformService, RetryPolicy, ServiceError, Timecode,
};
