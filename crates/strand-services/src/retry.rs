//! Bounded retry with exponential backoff and per-call timeouts.

use std::future::Future;
use std::time::Duration;

use crate::completion::{CompletionRequest, CompletionService};
use crate::error::{ServiceError, ServiceResult};
use crate::media::{CropRequest, FrameRequest, MediaOutput, MediaTransformService};

/// Retry policy applied around a capability call.
///
/// Attempts are bounded, each attempt runs under `timeout`, and the
/// delay before attempt `n + 1` doubles starting from
/// `initial_backoff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Deadline for each individual attempt.
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Creates a policy with explicit settings.
    pub const fn new(max_attempts: u32, initial_backoff: Duration, timeout: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            timeout,
        }
    }

    /// Default policy for LLM completion calls.
    pub const fn completion() -> Self {
        Self::new(2, Duration::from_secs(1), Duration::from_secs(120))
    }

    /// Default policy for media transform calls.
    pub const fn transform() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(60))
    }

    /// Returns the delay inserted before the given attempt (1-based).
    fn backoff_before(&self, attempt: u32) -> Duration {
        debug_assert!(attempt >= 2);
        self.initial_backoff
            .saturating_mul(1u32 << (attempt - 2).min(16))
    }

    /// Drives `op` to a settled result under this policy.
    ///
    /// `op` is invoked once per attempt; the caller only observes the
    /// final success or the exhaustion error carrying the last failure.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> ServiceResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut last: Option<ServiceError> = None;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.backoff_before(attempt)).await;
            }

            let outcome = match tokio::time::timeout(self.timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(ServiceError::Timeout(self.timeout)),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(error) => {
                    tracing::warn!(
                        target: crate::TRACING_TARGET,
                        capability = label,
                        attempt,
                        max_attempts,
                        error = %error,
                        "Capability call attempt failed"
                    );
                    last = Some(error);
                }
            }
        }

        let last = last
            .unwrap_or_else(|| ServiceError::invalid_response("no attempt produced a result"));
        Err(ServiceError::Exhausted {
            attempts: max_attempts,
            last: Box::new(last),
        })
    }
}

/// Completion service wrapped with a retry policy.
#[derive(Debug, Clone)]
pub struct RetryCompletion<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryCompletion<S> {
    /// Wraps a completion service with the default completion policy.
    pub fn new(inner: S) -> Self {
        Self::with_policy(inner, RetryPolicy::completion())
    }

    /// Wraps a completion service with an explicit policy.
    pub fn with_policy(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait::async_trait]
impl<S: CompletionService> CompletionService for RetryCompletion<S> {
    async fn complete(&self, request: CompletionRequest) -> ServiceResult<String> {
        self.policy
            .run("completion", || self.inner.complete(request.clone()))
            .await
    }
}

/// Media transform service wrapped with a retry policy.
#[derive(Debug, Clone)]
pub struct RetryTransform<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryTransform<S> {
    /// Wraps a transform service with the default transform policy.
    pub fn new(inner: S) -> Self {
        Self::with_policy(inner, RetryPolicy::transform())
    }

    /// Wraps a transform service with an explicit policy.
    pub fn with_policy(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait::async_trait]
impl<S: MediaTransformService> MediaTransformService for RetryTransform<S> {
    async fn crop_image(&self, request: CropRequest) -> ServiceResult<MediaOutput> {
        self.policy
            .run("crop_image", || self.inner.crop_image(request.clone()))
            .await
    }

    async fn extract_frame(&self, request: FrameRequest) -> ServiceResult<MediaOutput> {
        self.policy
            .run("extract_frame", || self.inner.extract_frame(request.clone()))
            .await
    }
}
