#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod completion;
mod error;
mod media;
mod retry;

pub use completion::{CompletionRequest, CompletionService};
pub use error::{ServiceError, ServiceResult};
pub use media::{CropRequest, FrameRequest, MediaOutput, MediaTransformService, Timecode};
pub use retry::{RetryCompletion, RetryPolicy, RetryTransform};

/// Tracing target for capability-service operations.
pub const TRACING_TARGET: &str = "strand_services";
