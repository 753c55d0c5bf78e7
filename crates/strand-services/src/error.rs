//! Error types for capability services.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type for capability-service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by capability services.
///
/// A capability call that exhausts its retry budget reports
/// [`ServiceError::Exhausted`] carrying the last underlying failure;
/// the engine treats whatever it receives as terminal.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The external provider rejected or failed the call.
    #[error("provider error: {provider}: {message}")]
    Provider {
        /// Name of the provider that failed.
        provider: String,
        /// Error message.
        message: String,
    },

    /// A single call exceeded its deadline.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// All retry attempts were spent.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The failure from the final attempt.
        #[source]
        last: Box<ServiceError>,
    },

    /// The provider returned a payload the contract does not allow.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServiceError {
    /// Creates a provider error.
    pub fn provider(provider: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(message: impl fmt::Display) -> Self {
        Self::InvalidResponse(message.to_string())
    }

    /// Returns whether this failure came from a spent retry budget.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}
