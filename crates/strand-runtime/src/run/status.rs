//! Run and node-execution status enumerations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Execution status of a workflow run.
///
/// `Completed`, `Failed`, and `Cancelled` are terminal: once a run
/// reaches one of them its row is read-only history. `Cancelled` is set
/// by an external actor, never by the scheduler.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    /// Run is waiting to start.
    #[default]
    Pending,
    /// Run is in progress.
    Running,
    /// Run finished with every scoped node completed or skipped.
    Completed,
    /// At least one node execution failed.
    Failed,
    /// Run was cancelled out-of-band.
    Cancelled,
}

impl RunStatus {
    /// Returns whether the run is waiting to start.
    #[inline]
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns whether the run is currently executing.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns whether the run completed successfully.
    #[inline]
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns whether the run failed.
    #[inline]
    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns whether the run has reached a terminal state.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Execution status of a single node within a run.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionStatus {
    /// Waiting for its parents to complete.
    #[default]
    Pending,
    /// Currently executing.
    Running,
    /// Finished successfully; outputs are available downstream.
    Completed,
    /// Finished with an error; descendants never become ready.
    Failed,
    /// Never became runnable within a finished run.
    Skipped,
}

impl ExecutionStatus {
    /// Returns whether the node is waiting to run.
    #[inline]
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns whether the node is currently executing.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns whether the node completed successfully.
    #[inline]
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns whether the node failed.
    #[inline]
    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns whether the node was skipped.
    #[inline]
    pub fn is_skipped(self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Returns whether the node has settled.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}
