//! LLM completion contract.

use serde::{Deserialize, Serialize};

use crate::error::ServiceResult;

/// A single completion call.
///
/// The vision path is selected by the presence of `image_urls`; there is
/// no separate trait method for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Fully composed prompt text.
    pub prompt: String,
    /// Image URLs for vision-capable models.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    /// Model identifier, provider default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl CompletionRequest {
    /// Creates a text-only completion request.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image_urls: Vec::new(),
            model: None,
        }
    }

    /// Attaches image URLs for the vision path.
    pub fn with_images(mut self, image_urls: impl IntoIterator<Item = String>) -> Self {
        self.image_urls = image_urls.into_iter().collect();
        self
    }

    /// Sets the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Returns whether this request uses the vision path.
    pub fn is_vision(&self) -> bool {
        !self.image_urls.is_empty()
    }
}

/// Text/vision completion capability.
#[async_trait::async_trait]
pub trait CompletionService: Send + Sync {
    /// Runs a completion and returns the generated text.
    async fn complete(&self, request: CompletionRequest) -> ServiceResult<String>;
}

#[async_trait::async_trait]
impl<T: CompletionService + ?Sized> CompletionService for std::sync::Arc<T> {
    async fn complete(&self, request: CompletionRequest) -> ServiceResult<String> {
        (**self).complete(request).await
    }
}
