//! Workflow execution scheduler.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::EngineConfig;
use super::handler::run_node;
use super::input::aggregate_inputs;
use crate::error::{WorkflowError, WorkflowResult};
use crate::graph::{NodeId, WorkflowGraph, WorkflowId};
use crate::run::{
    ExecutionStatus, NewNodeExecution, NodeExecution, RunId, RunStatus, UpdateNodeExecution,
    UpdateWorkflowRun,
};
use crate::store::RunStore;
use strand_services::{CompletionService, MediaTransformService, RetryCompletion, RetryTransform};

/// Tracing target for engine operations.
const TRACING_TARGET: &str = "strand_runtime::engine";

/// A request to execute a workflow run.
///
/// `run_id` is caller-assigned so the trigger can return it before the
/// run is picked up. When `selected_node_ids` is present only the
/// upstream closure of those nodes executes; execution rows outside the
/// scope are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    /// Caller-assigned run identifier.
    pub run_id: RunId,
    /// The workflow to execute.
    pub workflow_id: WorkflowId,
    /// Triggering account.
    pub account_id: Uuid,
    /// Run-level initial inputs, merged into every node's input.
    #[serde(default)]
    pub inputs: Value,
    /// Restricts the run to these nodes and their ancestors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_node_ids: Option<Vec<NodeId>>,
}

impl RunRequest {
    /// Creates a request executing the full workflow.
    pub fn new(run_id: RunId, workflow_id: WorkflowId, account_id: Uuid) -> Self {
        Self {
            run_id,
            workflow_id,
            account_id,
            inputs: Value::Null,
            selected_node_ids: None,
        }
    }

    /// Sets the run-level initial inputs.
    pub fn with_inputs(mut self, inputs: Value) -> Self {
        self.inputs = inputs;
        self
    }

    /// Scopes the run to the given nodes and their ancestors.
    pub fn with_selected_nodes(mut self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        self.selected_node_ids = Some(ids.into_iter().collect());
        self
    }
}

/// Outcome of one engine invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// The executed run.
    pub run_id: RunId,
    /// Final run status.
    pub status: RunStatus,
    /// Number of scheduler batches executed.
    pub batches: usize,
}

/// The workflow execution engine.
///
/// Drives a run to a terminal state with level-synchronous batch
/// concurrency: every currently-ready node executes in parallel, the
/// batch settles, and newly unblocked nodes form the next batch. All
/// state transitions are written through the injected store as they
/// occur.
pub struct Engine {
    config: EngineConfig,
    store: Arc<dyn RunStore>,
    completion: Arc<dyn CompletionService>,
    media: Arc<dyn MediaTransformService>,
    semaphore: Arc<Semaphore>,
}

impl Engine {
    /// Creates a new engine over a store and raw capability services.
    ///
    /// The services are wrapped in the retry policies carried by
    /// `config`; the scheduler itself never retries a node.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn RunStore>,
        completion: Arc<dyn CompletionService>,
        media: Arc<dyn MediaTransformService>,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_runs));
        let completion: Arc<dyn CompletionService> = Arc::new(RetryCompletion::with_policy(
            completion,
            config.completion_retry,
        ));
        let media: Arc<dyn MediaTransformService> =
            Arc::new(RetryTransform::with_policy(media, config.transform_retry));

        tracing::info!(
            target: TRACING_TARGET,
            max_concurrent_runs = config.max_concurrent_runs,
            "Workflow engine initialized"
        );

        Self {
            config,
            store,
            completion,
            media,
            semaphore,
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the persistence port the engine writes through.
    pub fn store(&self) -> &Arc<dyn RunStore> {
        &self.store
    }

    /// Returns the number of available run slots.
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Executes a run to its terminal state.
    ///
    /// A run that is already terminal is returned untouched. A
    /// malformed graph (dangling edge, cycle) fails the run before any
    /// node execution is created.
    pub async fn execute(&self, request: &RunRequest) -> WorkflowResult<RunSummary> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| WorkflowError::Internal(format!("semaphore closed: {e}")))?;

        let run = self.store.get_run(request.run_id).await?;
        if run.status.is_terminal() {
            tracing::debug!(
                target: TRACING_TARGET,
                run_id = %run.id,
                status = %run.status,
                "Run already terminal, not re-executing"
            );
            return Ok(RunSummary {
                run_id: run.id,
                status: run.status,
                batches: 0,
            });
        }

        let workflow = self.store.get_workflow(run.workflow_id).await?;
        let graph = match WorkflowGraph::from_workflow(&workflow)
            .and_then(|graph| graph.validate_acyclic().map(|()| graph))
        {
            Ok(graph) => graph,
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    run_id = %run.id,
                    error = %error,
                    "Workflow graph is invalid, failing run"
                );
                self.finish_run(request.run_id, RunStatus::Failed).await;
                return Err(error);
            }
        };

        let scope: HashSet<NodeId> = match &request.selected_node_ids {
            Some(ids) => graph.upstream_closure(ids.iter().copied()),
            None => graph.node_ids().collect(),
        };

        let mut executions: HashMap<NodeId, NodeExecution> = self
            .store
            .list_executions(request.run_id)
            .await?
            .into_iter()
            .map(|execution| (execution.node_id, execution))
            .collect();

        for node_id in &scope {
            if !executions.contains_key(node_id) {
                let execution = self
                    .store
                    .create_execution(NewNodeExecution {
                        run_id: request.run_id,
                        node_id: *node_id,
                    })
                    .await?;
                executions.insert(*node_id, execution);
            }
        }

        // Outputs of already-completed rows seed the aggregation map so
        // a scoped continuation can feed from earlier results.
        let mut outputs: HashMap<NodeId, Value> = executions
            .values()
            .filter(|execution| execution.status.is_completed())
            .filter_map(|execution| {
                execution
                    .outputs
                    .clone()
                    .map(|outputs| (execution.node_id, outputs))
            })
            .collect();

        self.store
            .update_run(request.run_id, UpdateWorkflowRun::started(Timestamp::now()))
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            run_id = %request.run_id,
            node_count = scope.len(),
            "Starting workflow run"
        );

        let mut batches = 0usize;
        loop {
            let mut ready: Vec<NodeId> = scope
                .iter()
                .copied()
                .filter(|id| {
                    executions
                        .get(id)
                        .is_some_and(|execution| execution.status.is_pending())
                })
                .filter(|id| {
                    graph.is_ready(*id, |source| {
                        executions
                            .get(&source)
                            .is_some_and(|execution| execution.status.is_completed())
                    })
                })
                .collect();

            if ready.is_empty() {
                break;
            }
            // Stable order for logs; siblings still run concurrently.
            ready.sort();
            batches += 1;

            tracing::debug!(
                target: TRACING_TARGET,
                run_id = %request.run_id,
                batch = batches,
                width = ready.len(),
                "Executing ready batch"
            );

            let batch: Vec<NodeExecution> = ready
                .iter()
                .filter_map(|id| executions.get(id).cloned())
                .collect();
            let settled = join_all(
                batch
                    .into_iter()
                    .map(|row| self.execute_node(&graph, request, &outputs, row)),
            )
            .await;

            for row in settled {
                if row.status.is_completed() {
                    if let Some(out) = row.outputs.clone() {
                        outputs.insert(row.node_id, out);
                    }
                }
                executions.insert(row.node_id, row);
            }
        }

        let status = self
            .finalize(request.run_id, &scope, &mut executions)
            .await;

        tracing::info!(
            target: TRACING_TARGET,
            run_id = %request.run_id,
            status = %status,
            batches,
            "Workflow run finished"
        );

        Ok(RunSummary {
            run_id: request.run_id,
            status,
            batches,
        })
    }

    /// Executes a single node and returns its settled row.
    ///
    /// Failures are contained: the row is marked Failed and siblings in
    /// the same batch are unaffected.
    async fn execute_node(
        &self,
        graph: &WorkflowGraph,
        request: &RunRequest,
        parent_outputs: &HashMap<NodeId, Value>,
        mut row: NodeExecution,
    ) -> NodeExecution {
        let node_id = row.node_id;
        let started = Timestamp::now();
        self.apply_execution(&mut row, UpdateNodeExecution::started(started))
            .await;

        let input = aggregate_inputs(graph, node_id, &request.inputs, parent_outputs);
        let inputs_snapshot = Value::Object(input.clone());

        let result = match graph.node(node_id) {
            Some(node) => {
                run_node(
                    node_id,
                    &node.kind,
                    &input,
                    self.completion.as_ref(),
                    self.media.as_ref(),
                )
                .await
            }
            None => Err(WorkflowError::MissingNode(node_id)),
        };

        let settled_at = Timestamp::now();
        let duration_ms = settled_at.duration_since(started).as_millis() as i64;

        let changes = match result {
            Ok(node_outputs) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    run_id = %request.run_id,
                    node_id = %node_id,
                    duration_ms,
                    "Node completed"
                );
                UpdateNodeExecution::completed(inputs_snapshot, node_outputs, duration_ms, settled_at)
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    run_id = %request.run_id,
                    node_id = %node_id,
                    error = %error,
                    "Node failed"
                );
                UpdateNodeExecution::failed(
                    Some(inputs_snapshot),
                    error.to_string(),
                    duration_ms,
                    settled_at,
                )
            }
        };
        self.apply_execution(&mut row, changes).await;
        row
    }

    /// Applies a changeset locally, then persists it.
    ///
    /// In-memory state advances even when the write fails; the
    /// divergence is logged and the run carries on.
    async fn apply_execution(&self, row: &mut NodeExecution, changes: UpdateNodeExecution) {
        changes.apply(row);
        if let Err(error) = self.store.update_execution(row.id, changes).await {
            tracing::warn!(
                target: TRACING_TARGET,
                execution_id = %row.id,
                node_id = %row.node_id,
                error = %error,
                "Failed to persist node execution transition"
            );
        }
    }

    /// Settles leftover rows and writes the final run status.
    ///
    /// Scoped rows still Pending can never run (a parent failed or was
    /// skipped); they are marked Skipped so a finished run never shows
    /// an indefinite Pending. The run fails iff any scoped row failed.
    async fn finalize(
        &self,
        run_id: RunId,
        scope: &HashSet<NodeId>,
        executions: &mut HashMap<NodeId, NodeExecution>,
    ) -> RunStatus {
        let now = Timestamp::now();
        let mut any_failed = false;

        for node_id in scope {
            let Some(row) = executions.get_mut(node_id) else {
                continue;
            };
            match row.status {
                ExecutionStatus::Failed => any_failed = true,
                ExecutionStatus::Pending => {
                    let changes = UpdateNodeExecution::skipped(now);
                    changes.apply(row);
                    if let Err(error) = self.store.update_execution(row.id, changes).await {
                        tracing::warn!(
                            target: TRACING_TARGET,
                            execution_id = %row.id,
                            error = %error,
                            "Failed to persist skip transition"
                        );
                    }
                }
                _ => {}
            }
        }

        let status = if any_failed {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };
        self.finish_run(run_id, status).await;
        status
    }

    /// Writes the terminal run status, unless an external actor already
    /// moved the run to a terminal state (e.g. cancelled it mid-run).
    async fn finish_run(&self, run_id: RunId, status: RunStatus) {
        match self.store.get_run(run_id).await {
            Ok(run) if run.status.is_terminal() => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    run_id = %run_id,
                    status = %run.status,
                    "Run already terminal, keeping external status"
                );
            }
            _ => {
                let changes = UpdateWorkflowRun::finished(status, Timestamp::now());
                if let Err(error) = self.store.update_run(run_id, changes).await {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        run_id = %run_id,
                        error = %error,
                        "Failed to persist final run status"
                    );
                }
            }
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("available_slots", &self.available_slots())
            .finish()
    }
}
