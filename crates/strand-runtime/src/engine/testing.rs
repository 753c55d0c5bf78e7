//! Capability service doubles shared by engine and runtime tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use strand_services::{
    CompletionRequest, CompletionService, CropRequest, FrameRequest, MediaOutput,
    MediaTransformService, ServiceError, ServiceResult,
};

/// Echoes the prompt back, tagging vision requests with their image count.
pub(crate) struct EchoCompletion;

#[async_trait]
impl CompletionService for EchoCompletion {
    async fn complete(&self, request: CompletionRequest) -> ServiceResult<String> {
        if request.is_vision() {
            Ok(format!(
                "echo[{}]: {}",
                request.image_urls.len(),
                request.prompt
            ))
        } else {
            Ok(format!("echo: {}", request.prompt))
        }
    }
}

/// Records every request it receives and answers `"ok"`.
#[derive(Default)]
pub(crate) struct RecordingCompletion {
    requests: Mutex<Vec<CompletionRequest>>,
}

impl RecordingCompletion {
    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for RecordingCompletion {
    async fn complete(&self, request: CompletionRequest) -> ServiceResult<String> {
        self.requests.lock().unwrap().push(request);
        Ok("ok".to_owned())
    }
}

/// Blocks each call until the test releases a permit.
pub(crate) struct GateCompletion {
    pub(crate) gate: Arc<Semaphore>,
}

impl GateCompletion {
    pub(crate) fn new() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (Self { gate: gate.clone() }, gate)
    }
}

#[async_trait]
impl CompletionService for GateCompletion {
    async fn complete(&self, request: CompletionRequest) -> ServiceResult<String> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ServiceError::provider("gate", e.to_string()))?;
        permit.forget();
        Ok(format!("gated: {}", request.prompt))
    }
}

/// Always fails with a provider error.
pub(crate) struct FailCompletion;

#[async_trait]
impl CompletionService for FailCompletion {
    async fn complete(&self, _request: CompletionRequest) -> ServiceResult<String> {
        Err(ServiceError::provider("test", "completion unavailable"))
    }
}

/// Returns derived URLs without touching any media.
pub(crate) struct StubMedia;

#[async_trait]
impl MediaTransformService for StubMedia {
    async fn crop_image(&self, request: CropRequest) -> ServiceResult<MediaOutput> {
        Ok(MediaOutput {
            url: format!("{}#cropped", request.image_url),
        })
    }

    async fn extract_frame(&self, request: FrameRequest) -> ServiceResult<MediaOutput> {
        Ok(MediaOutput {
            url: format!("{}#frame", request.video_url),
        })
    }
}

/// Always fails with a provider error.
pub(crate) struct FailMedia;

#[async_trait]
impl MediaTransformService for FailMedia {
    async fn crop_image(&self, _request: CropRequest) -> ServiceResult<MediaOutput> {
        Err(ServiceError::provider("test", "media backend down"))
    }

    async fn extract_frame(&self, _request: FrameRequest) -> ServiceResult<MediaOutput> {
        Err(ServiceError::provider("test", "media backend down"))
    }
}
