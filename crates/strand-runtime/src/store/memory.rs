//! In-memory implementation of the persistence port.

use std::collections::HashMap;

use jiff::Timestamp;
use tokio::sync::RwLock;

use super::{RunStore, StoreError, StoreResult};
use crate::graph::{Workflow, WorkflowId};
use crate::run::{
    ExecutionId, NewNodeExecution, NewWorkflowRun, NodeExecution, RunId, UpdateNodeExecution,
    UpdateWorkflowRun, WorkflowRun,
};

#[derive(Debug, Default)]
struct Inner {
    workflows: HashMap<WorkflowId, Workflow>,
    runs: HashMap<RunId, WorkflowRun>,
    executions: HashMap<ExecutionId, NodeExecution>,
}

/// In-memory graph store.
///
/// Writes are visible to the next read as soon as the lock is released,
/// which satisfies the observation contract exactly.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a workflow, replacing any previous version.
    pub async fn insert_workflow(&self, workflow: Workflow) {
        self.inner
            .write()
            .await
            .workflows
            .insert(workflow.id, workflow);
    }

    /// Returns the number of execution rows across all runs.
    pub async fn execution_count(&self) -> usize {
        self.inner.read().await.executions.len()
    }
}

#[async_trait::async_trait]
impl RunStore for MemoryStore {
    async fn get_workflow(&self, id: WorkflowId) -> StoreResult<Workflow> {
        self.inner
            .read()
            .await
            .workflows
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("workflow", id))
    }

    async fn create_run(&self, new: NewWorkflowRun) -> StoreResult<WorkflowRun> {
        let mut inner = self.inner.write().await;
        if inner.runs.contains_key(&new.id) {
            return Err(StoreError::conflict("run", new.id));
        }
        let run = new.into_record(Timestamp::now());
        inner.runs.insert(run.id, run.clone());
        Ok(run)
    }

    async fn get_run(&self, id: RunId) -> StoreResult<WorkflowRun> {
        self.inner
            .read()
            .await
            .runs
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("run", id))
    }

    async fn update_run(&self, id: RunId, changes: UpdateWorkflowRun) -> StoreResult<WorkflowRun> {
        let mut inner = self.inner.write().await;
        let run = inner
            .runs
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("run", id))?;
        changes.apply(run);
        Ok(run.clone())
    }

    async fn list_executions(&self, run_id: RunId) -> StoreResult<Vec<NodeExecution>> {
        let inner = self.inner.read().await;
        let mut executions: Vec<NodeExecution> = inner
            .executions
            .values()
            .filter(|execution| execution.run_id == run_id)
            .cloned()
            .collect();
        // Row ids are v7 uuids, so this is creation order.
        executions.sort_by_key(|execution| execution.id);
        Ok(executions)
    }

    async fn create_execution(&self, new: NewNodeExecution) -> StoreResult<NodeExecution> {
        let mut inner = self.inner.write().await;
        let execution = new.into_record(Timestamp::now());
        inner.executions.insert(execution.id, execution.clone());
        Ok(execution)
    }

    async fn update_execution(
        &self,
        id: ExecutionId,
        changes: UpdateNodeExecution,
    ) -> StoreResult<NodeExecution> {
        let mut inner = self.inner.write().await;
        let execution = inner
            .executions
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("execution", id))?;
        changes.apply(execution);
        Ok(execution.clone())
    }
}
