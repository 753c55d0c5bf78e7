//! Run lifecycle service over the engine.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::engine::{Engine, RunRequest, RunSummary};
use crate::error::{WorkflowError, WorkflowResult};
use crate::run::{NewWorkflowRun, RunDocument, RunId};
use crate::store::RunStore;

/// Tracing target for run lifecycle operations.
const TRACING_TARGET: &str = "strand_runtime::runtime";

/// Handle to a spawned workflow run.
///
/// Dropping the handle detaches the run; it keeps executing and its
/// state remains observable through [`RuntimeService::run_document`].
#[derive(Debug)]
pub struct RunHandle {
    run_id: RunId,
    task: JoinHandle<WorkflowResult<RunSummary>>,
}

impl RunHandle {
    /// Returns the run this handle tracks.
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Waits for the run task to settle.
    pub async fn join(self) -> WorkflowResult<RunSummary> {
        self.task
            .await
            .map_err(|e| WorkflowError::Internal(format!("run task failed: {e}")))?
    }
}

/// Accepts run triggers and serves run state to pollers.
///
/// Triggering is fire-and-forget: `enqueue` returns as soon as the run
/// task is spawned, and callers observe progress by polling
/// `run_document`. At most one task per run id is in flight at a time.
pub struct RuntimeService {
    engine: Arc<Engine>,
    store: Arc<dyn RunStore>,
    in_flight: Arc<Mutex<HashSet<RunId>>>,
}

impl RuntimeService {
    /// Creates a service around an engine.
    pub fn new(engine: Engine) -> Self {
        let store = engine.store().clone();
        Self {
            engine: Arc::new(engine),
            store,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Returns whether a task for the run is currently in flight.
    pub async fn is_in_flight(&self, run_id: RunId) -> bool {
        self.in_flight.lock().await.contains(&run_id)
    }

    /// Spawns execution of a run and returns a handle to it.
    ///
    /// The run row is created if it does not exist yet, so the caller
    /// can poll `run_document` immediately. A second trigger for a run
    /// that is still in flight is rejected with
    /// [`WorkflowError::RunInFlight`]; re-triggering a settled run is
    /// allowed and leaves terminal state untouched. A trigger from an
    /// account that does not own the workflow (or the existing run) is
    /// rejected with [`WorkflowError::NotOwner`].
    pub async fn enqueue(&self, request: RunRequest) -> WorkflowResult<RunHandle> {
        let run_id = request.run_id;
        {
            let mut in_flight = self.in_flight.lock().await;
            if !in_flight.insert(run_id) {
                return Err(WorkflowError::RunInFlight(run_id));
            }
        }

        if let Err(error) = self.ensure_run(&request).await {
            self.in_flight.lock().await.remove(&run_id);
            return Err(error);
        }

        tracing::info!(
            target: TRACING_TARGET,
            run_id = %run_id,
            workflow_id = %request.workflow_id,
            scoped = request.selected_node_ids.is_some(),
            "Run enqueued"
        );

        let engine = self.engine.clone();
        let in_flight = self.in_flight.clone();
        let task = tokio::spawn(async move {
            let result = engine.execute(&request).await;
            in_flight.lock().await.remove(&run_id);
            if let Err(error) = &result {
                tracing::error!(
                    target: TRACING_TARGET,
                    run_id = %run_id,
                    error = %error,
                    "Run task failed"
                );
            }
            result
        });

        Ok(RunHandle { run_id, task })
    }

    /// Assembles the current poll document for a run.
    pub async fn run_document(&self, run_id: RunId) -> WorkflowResult<RunDocument> {
        let run = self.store.get_run(run_id).await?;
        let executions = self.store.list_executions(run_id).await?;
        Ok(RunDocument::assemble(run, executions))
    }

    /// Creates the run row unless it already exists.
    ///
    /// The triggering account must own what it triggers: the run row if
    /// one exists, otherwise the workflow the row is created for.
    async fn ensure_run(&self, request: &RunRequest) -> WorkflowResult<()> {
        let not_owner = || WorkflowError::NotOwner {
            workflow_id: request.workflow_id,
            account_id: request.account_id,
        };
        match self.store.get_run(request.run_id).await {
            Ok(run) if run.account_id != request.account_id => Err(not_owner()),
            Ok(_) => Ok(()),
            Err(error) if error.is_not_found() => {
                let workflow = self.store.get_workflow(request.workflow_id).await?;
                if workflow.account_id != request.account_id {
                    return Err(not_owner());
                }
                self.store
                    .create_run(NewWorkflowRun {
                        id: request.run_id,
                        workflow_id: request.workflow_id,
                        account_id: request.account_id,
                    })
                    .await?;
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }
}

impl std::fmt::Debug for RuntimeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeService")
            .field("engine", &self.engine)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::engine::testing::{
        EchoCompletion, FailCompletion, FailMedia, GateCompletion, RecordingCompletion, StubMedia,
    };
    use crate::engine::EngineConfig;
    use crate::graph::{
        CropConfig, Edge, ExtractFrameConfig, LlmConfig, Node, NodeId, NodeKind, TextConfig,
        UploadConfig, Workflow,
    };
    use crate::run::{ExecutionStatus, RunStatus, UpdateWorkflowRun};
    use crate::store::MemoryStore;
    use jiff::Timestamp;
    use strand_services::{CompletionService, MediaTransformService, RetryPolicy, Timecode};

    fn fast_config() -> EngineConfig {
        let policy = RetryPolicy::new(1, Duration::from_millis(1), Duration::from_secs(5));
        EngineConfig::builder()
            .max_concurrent_runs(4usize)
            .completion_retry(policy)
            .transform_retry(policy)
            .build()
            .unwrap()
    }

    fn service(
        store: Arc<MemoryStore>,
        completion: impl CompletionService + 'static,
        media: impl MediaTransformService + 'static,
    ) -> RuntimeService {
        let engine = Engine::new(
            fast_config(),
            store,
            Arc::new(completion),
            Arc::new(media),
        );
        RuntimeService::new(engine)
    }

    fn text(value: &str) -> Node {
        Node::new(TextConfig {
            text: Some(value.to_owned()),
        })
    }

    fn llm() -> Node {
        Node::new(LlmConfig::default())
    }

    fn upload_image(url: Option<&str>) -> Node {
        Node::new(NodeKind::UploadImage(UploadConfig {
            url: url.map(str::to_owned),
        }))
    }

    fn crop() -> Node {
        Node::new(CropConfig {
            width: Some(50.0),
            height: Some(50.0),
        })
    }

    fn upload_video(url: Option<&str>) -> Node {
        Node::new(NodeKind::UploadVideo(UploadConfig {
            url: url.map(str::to_owned),
        }))
    }

    fn extract_frame(timestamp: Option<Timecode>) -> Node {
        Node::new(ExtractFrameConfig { timestamp })
    }

    fn node_id(n: u128) -> NodeId {
        NodeId::from(Uuid::from_u128(n))
    }

    fn request(workflow: &Workflow) -> RunRequest {
        RunRequest::new(RunId::new(), workflow.id, workflow.account_id)
    }

    #[tokio::test]
    async fn linear_text_to_llm_completes() {
        let store = Arc::new(MemoryStore::new());
        let (a, b) = (node_id(1), node_id(2));
        let mut workflow = Workflow::new(Uuid::new_v4(), "linear");
        workflow
            .add_node(a, text("Hello"))
            .add_node(b, llm())
            .connect(a, b);
        store.insert_workflow(workflow.clone()).await;

        let service = service(store, EchoCompletion, StubMedia);
        let handle = service.enqueue(request(&workflow)).await.unwrap();
        let run_id = handle.run_id();
        let summary = handle.join().await.unwrap();

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.batches, 2);

        let document = service.run_document(run_id).await.unwrap();
        assert_eq!(document.status, RunStatus::Completed);
        assert!(document.completed_at.is_some());
        assert_eq!(document.node_executions.len(), 2);

        let text_row = document.node(a).unwrap();
        assert_eq!(text_row.status, ExecutionStatus::Completed);
        assert_eq!(text_row.outputs.as_ref().unwrap()["text"], "Hello");

        // The upstream text flows in through the whole-outputs merge.
        let llm_row = document.node(b).unwrap();
        assert_eq!(llm_row.status, ExecutionStatus::Completed);
        assert_eq!(llm_row.outputs.as_ref().unwrap()["text"], "echo: Hello");
        assert!(llm_row.duration_ms.is_some());
    }

    #[tokio::test]
    async fn missing_upload_url_fails_downstream_crop() {
        let store = Arc::new(MemoryStore::new());
        let (a, b) = (node_id(1), node_id(2));
        let mut workflow = Workflow::new(Uuid::new_v4(), "crop-missing-url");
        workflow
            .add_node(a, upload_image(None))
            .add_node(b, crop())
            .connect(a, b);
        store.insert_workflow(workflow.clone()).await;

        let service = service(store, EchoCompletion, StubMedia);
        let handle = service.enqueue(request(&workflow)).await.unwrap();
        let summary = handle.join().await.unwrap();
        assert_eq!(summary.status, RunStatus::Failed);

        let document = service.run_document(summary.run_id).await.unwrap();
        assert_eq!(document.node(a).unwrap().status, ExecutionStatus::Completed);

        let crop_row = document.node(b).unwrap();
        assert_eq!(crop_row.status, ExecutionStatus::Failed);
        assert!(
            crop_row
                .error
                .as_deref()
                .unwrap()
                .contains("no input image to crop")
        );
    }

    #[tokio::test]
    async fn extract_frame_emits_the_frame_url() {
        let store = Arc::new(MemoryStore::new());
        let (video, frame) = (node_id(1), node_id(2));
        let mut workflow = Workflow::new(Uuid::new_v4(), "frame-grab");
        workflow
            .add_node(video, upload_video(Some("https://cdn.test/clip.mp4")))
            .add_node(frame, extract_frame(Some(Timecode::Percent(25.0))))
            .connect(video, frame);
        store.insert_workflow(workflow.clone()).await;

        let service = service(store, EchoCompletion, StubMedia);
        let summary = service
            .enqueue(request(&workflow))
            .await
            .unwrap()
            .join()
            .await
            .unwrap();
        assert_eq!(summary.status, RunStatus::Completed);

        let document = service.run_document(summary.run_id).await.unwrap();
        let frame_row = document.node(frame).unwrap();
        assert_eq!(frame_row.status, ExecutionStatus::Completed);
        let outputs = frame_row.outputs.as_ref().unwrap();
        for key in ["output", "url", "image"] {
            assert_eq!(outputs[key], "https://cdn.test/clip.mp4#frame");
        }
    }

    #[tokio::test]
    async fn missing_upload_url_fails_downstream_frame_extraction() {
        let store = Arc::new(MemoryStore::new());
        let (video, frame) = (node_id(1), node_id(2));
        let mut workflow = Workflow::new(Uuid::new_v4(), "frame-missing-url");
        workflow
            .add_node(video, upload_video(None))
            .add_node(frame, extract_frame(None))
            .connect(video, frame);
        store.insert_workflow(workflow.clone()).await;

        let service = service(store, EchoCompletion, StubMedia);
        let summary = service
            .enqueue(request(&workflow))
            .await
            .unwrap()
            .join()
            .await
            .unwrap();
        assert_eq!(summary.status, RunStatus::Failed);

        let document = service.run_document(summary.run_id).await.unwrap();
        assert_eq!(document.node(video).unwrap().status, ExecutionStatus::Completed);

        let frame_row = document.node(frame).unwrap();
        assert_eq!(frame_row.status, ExecutionStatus::Failed);
        assert!(
            frame_row
                .error
                .as_deref()
                .unwrap()
                .contains("no input video for frame extraction")
        );
    }

    #[tokio::test]
    async fn independent_chains_run_in_shared_batches() {
        let store = Arc::new(MemoryStore::new());
        let ids = [node_id(1), node_id(2), node_id(3), node_id(4)];
        let mut workflow = Workflow::new(Uuid::new_v4(), "parallel-chains");
        workflow
            .add_node(ids[0], text("first"))
            .add_node(ids[1], llm())
            .add_node(ids[2], text("second"))
            .add_node(ids[3], llm())
            .connect(ids[0], ids[1])
            .connect(ids[2], ids[3]);
        store.insert_workflow(workflow.clone()).await;

        let service = service(store, EchoCompletion, StubMedia);
        let summary = service
            .enqueue(request(&workflow))
            .await
            .unwrap()
            .join()
            .await
            .unwrap();

        // Both chains advance within the same two batches.
        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.batches, 2);
    }

    #[tokio::test]
    async fn diamond_joins_after_both_branches() {
        let store = Arc::new(MemoryStore::new());
        let (root, left, right, sink) = (node_id(1), node_id(2), node_id(3), node_id(4));
        let mut workflow = Workflow::new(Uuid::new_v4(), "diamond");
        workflow
            .add_node(root, text("go"))
            .add_node(left, llm())
            .add_node(right, llm())
            .add_node(sink, llm())
            .connect(root, left)
            .connect(root, right)
            .add_edge(Edge::new(left, sink).with_target_handle("system_prompt"))
            .add_edge(Edge::new(right, sink).with_target_handle("user_message"));
        store.insert_workflow(workflow.clone()).await;

        let service = service(store, EchoCompletion, StubMedia);
        let summary = service
            .enqueue(request(&workflow))
            .await
            .unwrap()
            .join()
            .await
            .unwrap();
        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.batches, 3);

        let document = service.run_document(summary.run_id).await.unwrap();
        let sink_row = document.node(sink).unwrap();
        assert_eq!(
            sink_row.outputs.as_ref().unwrap()["text"],
            "echo: echo: go\n\necho: go"
        );

        // The join node never starts before both parents settle.
        let sink_started = sink_row.started_at.unwrap();
        for parent in [left, right] {
            let settled = document.node(parent).unwrap().completed_at.unwrap();
            assert!(sink_started >= settled);
        }
    }

    #[tokio::test]
    async fn selected_nodes_scope_to_upstream_closure() {
        let store = Arc::new(MemoryStore::new());
        let (a, b, c, orphan) = (node_id(1), node_id(2), node_id(3), node_id(4));
        let mut workflow = Workflow::new(Uuid::new_v4(), "scoped");
        workflow
            .add_node(a, text("up"))
            .add_node(b, llm())
            .add_node(c, llm())
            .add_node(orphan, text("elsewhere"))
            .connect(a, b)
            .connect(b, c);
        store.insert_workflow(workflow.clone()).await;

        let service = service(store.clone(), EchoCompletion, StubMedia);
        let request = request(&workflow).with_selected_nodes([b]);
        let summary = service.enqueue(request).await.unwrap().join().await.unwrap();
        assert_eq!(summary.status, RunStatus::Completed);

        // Only the closure {a, b} gets execution rows.
        let document = service.run_document(summary.run_id).await.unwrap();
        assert_eq!(document.node_executions.len(), 2);
        assert_eq!(document.node(b).unwrap().status, ExecutionStatus::Completed);
        assert!(document.node(c).is_none());
        assert!(document.node(orphan).is_none());
        assert_eq!(store.execution_count().await, 2);
    }

    #[tokio::test]
    async fn unknown_node_type_is_skipped_not_failed() {
        let store = Arc::new(MemoryStore::new());
        let (a, b) = (node_id(1), node_id(2));
        let mut workflow = Workflow::new(Uuid::new_v4(), "unknown-type");
        workflow
            .add_node(
                a,
                Node::new(NodeKind::Other {
                    type_name: "hologram".to_owned(),
                    config: json!({}),
                }),
            )
            .add_node(b, text("plain"))
            .connect(a, b);
        store.insert_workflow(workflow.clone()).await;

        let service = service(store, EchoCompletion, StubMedia);
        let summary = service
            .enqueue(request(&workflow))
            .await
            .unwrap()
            .join()
            .await
            .unwrap();
        assert_eq!(summary.status, RunStatus::Completed);

        let document = service.run_document(summary.run_id).await.unwrap();
        let other_row = document.node(a).unwrap();
        assert_eq!(other_row.status, ExecutionStatus::Completed);
        assert_eq!(other_row.outputs, Some(json!({ "status": "skipped" })));
        assert_eq!(document.node(b).unwrap().status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn branch_failure_does_not_stop_siblings() {
        let store = Arc::new(MemoryStore::new());
        let (bad_root, bad_crop, bad_tail) = (node_id(1), node_id(2), node_id(3));
        let (good_root, good_llm) = (node_id(4), node_id(5));
        let mut workflow = Workflow::new(Uuid::new_v4(), "isolated-failure");
        workflow
            .add_node(bad_root, upload_image(None))
            .add_node(bad_crop, crop())
            .add_node(bad_tail, crop())
            .add_node(good_root, text("still fine"))
            .add_node(good_llm, llm())
            .connect(bad_root, bad_crop)
            .connect(bad_crop, bad_tail)
            .connect(good_root, good_llm);
        store.insert_workflow(workflow.clone()).await;

        let service = service(store, EchoCompletion, StubMedia);
        let summary = service
            .enqueue(request(&workflow))
            .await
            .unwrap()
            .join()
            .await
            .unwrap();
        assert_eq!(summary.status, RunStatus::Failed);

        let document = service.run_document(summary.run_id).await.unwrap();
        assert_eq!(
            document.node(bad_crop).unwrap().status,
            ExecutionStatus::Failed
        );
        assert_eq!(
            document.node(bad_tail).unwrap().status,
            ExecutionStatus::Skipped
        );
        assert_eq!(
            document.node(good_llm).unwrap().status,
            ExecutionStatus::Completed
        );
    }

    #[tokio::test]
    async fn provider_failures_fail_only_their_nodes() {
        let store = Arc::new(MemoryStore::new());
        let (prompt, sink, image, cropped) = (node_id(1), node_id(2), node_id(3), node_id(4));
        let mut workflow = Workflow::new(Uuid::new_v4(), "providers-down");
        workflow
            .add_node(prompt, text("ask"))
            .add_node(sink, llm())
            .add_node(image, upload_image(Some("https://cdn.test/in.png")))
            .add_node(cropped, crop())
            .connect(prompt, sink)
            .connect(image, cropped);
        store.insert_workflow(workflow.clone()).await;

        let service = service(store, FailCompletion, FailMedia);
        let summary = service
            .enqueue(request(&workflow))
            .await
            .unwrap()
            .join()
            .await
            .unwrap();
        assert_eq!(summary.status, RunStatus::Failed);

        let document = service.run_document(summary.run_id).await.unwrap();
        assert_eq!(document.node(prompt).unwrap().status, ExecutionStatus::Completed);
        assert_eq!(document.node(image).unwrap().status, ExecutionStatus::Completed);

        let llm_row = document.node(sink).unwrap();
        assert_eq!(llm_row.status, ExecutionStatus::Failed);
        assert!(
            llm_row
                .error
                .as_deref()
                .unwrap()
                .contains("completion unavailable")
        );
        assert!(
            document
                .node(cropped)
                .unwrap()
                .error
                .as_deref()
                .unwrap()
                .contains("media backend down")
        );
    }

    #[tokio::test]
    async fn duplicate_trigger_for_in_flight_run_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let a = node_id(1);
        let mut workflow = Workflow::new(Uuid::new_v4(), "single-flight");
        workflow.add_node(a, llm());
        store.insert_workflow(workflow.clone()).await;

        let (completion, gate) = GateCompletion::new();
        let service = service(store, completion, StubMedia);

        let first = request(&workflow).with_inputs(json!({ "prompt": "held" }));
        let run_id = first.run_id;
        let handle = service.enqueue(first.clone()).await.unwrap();
        assert!(service.is_in_flight(run_id).await);

        let rejected = service.enqueue(first).await.unwrap_err();
        assert!(matches!(rejected, WorkflowError::RunInFlight(id) if id == run_id));

        gate.add_permits(1);
        let summary = handle.join().await.unwrap();
        assert_eq!(summary.status, RunStatus::Completed);
        assert!(!service.is_in_flight(run_id).await);
    }

    #[tokio::test]
    async fn trigger_from_foreign_account_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let a = node_id(1);
        let mut workflow = Workflow::new(Uuid::new_v4(), "owned");
        workflow.add_node(a, text("private"));
        store.insert_workflow(workflow.clone()).await;

        let service = service(store.clone(), EchoCompletion, StubMedia);
        let foreign = RunRequest::new(RunId::new(), workflow.id, Uuid::new_v4());
        let run_id = foreign.run_id;
        let error = service.enqueue(foreign).await.unwrap_err();
        assert!(matches!(error, WorkflowError::NotOwner { .. }));

        // Nothing was created and the slot was released.
        assert!(store.get_run(run_id).await.unwrap_err().is_not_found());
        assert!(!service.is_in_flight(run_id).await);

        // The owner can still trigger the same workflow.
        let summary = service
            .enqueue(request(&workflow))
            .await
            .unwrap()
            .join()
            .await
            .unwrap();
        assert_eq!(summary.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn settled_run_is_not_re_executed() {
        let store = Arc::new(MemoryStore::new());
        let a = node_id(1);
        let mut workflow = Workflow::new(Uuid::new_v4(), "settled");
        workflow.add_node(a, text("once"));
        store.insert_workflow(workflow.clone()).await;

        let service = service(store.clone(), EchoCompletion, StubMedia);
        let first = request(&workflow);
        let summary = service.enqueue(first.clone()).await.unwrap().join().await.unwrap();
        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(store.execution_count().await, 1);

        let replay = service.enqueue(first).await.unwrap().join().await.unwrap();
        assert_eq!(replay.status, RunStatus::Completed);
        assert_eq!(replay.batches, 0);
        assert_eq!(store.execution_count().await, 1);
    }

    #[tokio::test]
    async fn cycle_fails_run_before_any_execution() {
        let store = Arc::new(MemoryStore::new());
        let (a, b) = (node_id(1), node_id(2));
        let mut workflow = Workflow::new(Uuid::new_v4(), "cyclic");
        workflow
            .add_node(a, text("a"))
            .add_node(b, llm())
            .connect(a, b)
            .connect(b, a);
        store.insert_workflow(workflow.clone()).await;

        let service = service(store.clone(), EchoCompletion, StubMedia);
        let request = request(&workflow);
        let run_id = request.run_id;
        let error = service
            .enqueue(request)
            .await
            .unwrap()
            .join()
            .await
            .unwrap_err();
        assert!(matches!(error, WorkflowError::CycleDetected));

        let document = service.run_document(run_id).await.unwrap();
        assert_eq!(document.status, RunStatus::Failed);
        assert!(document.node_executions.is_empty());
    }

    #[tokio::test]
    async fn cancelled_run_is_left_untouched() {
        let store = Arc::new(MemoryStore::new());
        let a = node_id(1);
        let mut workflow = Workflow::new(Uuid::new_v4(), "cancelled");
        workflow.add_node(a, text("never runs"));
        store.insert_workflow(workflow.clone()).await;

        let service = service(store.clone(), EchoCompletion, StubMedia);
        let request = request(&workflow);
        store
            .create_run(NewWorkflowRun {
                id: request.run_id,
                workflow_id: request.workflow_id,
                account_id: request.account_id,
            })
            .await
            .unwrap();
        store
            .update_run(
                request.run_id,
                UpdateWorkflowRun::finished(RunStatus::Cancelled, Timestamp::now()),
            )
            .await
            .unwrap();

        let summary = service.enqueue(request).await.unwrap().join().await.unwrap();
        assert_eq!(summary.status, RunStatus::Cancelled);
        assert_eq!(summary.batches, 0);
        assert_eq!(store.execution_count().await, 0);
    }

    #[tokio::test]
    async fn run_inputs_reach_every_node() {
        let store = Arc::new(MemoryStore::new());
        let a = node_id(1);
        let mut workflow = Workflow::new(Uuid::new_v4(), "run-inputs");
        workflow.add_node(a, llm());
        store.insert_workflow(workflow.clone()).await;

        let service = service(store, EchoCompletion, StubMedia);
        let request = request(&workflow).with_inputs(json!({ "user_message": "from the trigger" }));
        let summary = service.enqueue(request).await.unwrap().join().await.unwrap();
        assert_eq!(summary.status, RunStatus::Completed);

        let document = service.run_document(summary.run_id).await.unwrap();
        assert_eq!(
            document.node(a).unwrap().outputs.as_ref().unwrap()["text"],
            "echo: from the trigger"
        );
    }

    #[tokio::test]
    async fn images_handle_feeds_the_vision_path() {
        let store = Arc::new(MemoryStore::new());
        let (prompt, image, sink) = (node_id(1), node_id(2), node_id(3));
        let mut workflow = Workflow::new(Uuid::new_v4(), "vision");
        workflow
            .add_node(prompt, text("describe this"))
            .add_node(image, upload_image(Some("https://cdn.test/cat.png")))
            .add_node(
                sink,
                Node::new(LlmConfig {
                    model: Some("pixel-scan-1".to_owned()),
                    ..Default::default()
                }),
            )
            .connect(prompt, sink)
            .add_edge(Edge::new(image, sink).with_target_handle("images"));
        store.insert_workflow(workflow.clone()).await;

        let completion = Arc::new(RecordingCompletion::default());
        let engine = Engine::new(
            fast_config(),
            store,
            completion.clone(),
            Arc::new(StubMedia),
        );
        let service = RuntimeService::new(engine);

        let summary = service
            .enqueue(request(&workflow))
            .await
            .unwrap()
            .join()
            .await
            .unwrap();
        assert_eq!(summary.status, RunStatus::Completed);

        let requests = completion.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].is_vision());
        assert_eq!(requests[0].image_urls, vec!["https://cdn.test/cat.png"]);
        assert_eq!(requests[0].prompt, "describe this");
        assert_eq!(requests[0].model.as_deref(), Some("pixel-scan-1"));
    }
}
