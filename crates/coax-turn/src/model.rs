//! Contract with the language model service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One request to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Room, character, and output format instructions.
    pub system_prompt: String,
    /// The player's sanitized message.
    pub user_message: String,
}

/// Why a model call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The service asked us to slow down. Retryable.
    #[error("rate limited")]
    RateLimited,

    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with an error status.
    #[error("api error {status}: {message}")]
    Api {
        /// HTTP-style status code.
        status: u16,
        /// Error body or reason.
        message: String,
    },

    /// The service answered with nothing.
    #[error("empty response")]
    EmptyResponse,

    /// The call took too long.
    #[error("model call timed out")]
    Timeout,
}

impl ModelError {
    /// Classify an HTTP status; 429 is a rate limit.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        if status == 429 {
            Self::RateLimited
        } else {
            Self::Api {
                status,
                message: message.into(),
            }
        }
    }

    /// Only rate limits are worth retrying.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

/// A language model that turns a prompt into a (hopefully JSON) reply.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one request and return the raw reply text.
    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelError>;
}
