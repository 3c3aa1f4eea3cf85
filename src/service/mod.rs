//! Answer service integration

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpAnswerClient;

/// Shown when the service replies without an answer
pub const NO_RESPONSE: &str = "No response.";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Body of `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

/// Reply from `POST /ask`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: Option<String>,
}

impl AskResponse {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
        }
    }

    /// The answer text, or `NO_RESPONSE` when it is missing or empty
    pub fn into_text(self) -> String {
        match self.answer {
            Some(answer) if !answer.is_empty() => answer,
            _ => NO_RESPONSE.to_string(),
        }
    }
}

/// Something that turns a question into an answer
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn ask(&self, query: &str) -> Result<AskResponse, ServiceError>;
}
