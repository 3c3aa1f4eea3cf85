//! HTTP answer service client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{AnswerService, AskRequest, AskResponse, ServiceError};

pub struct HttpAnswerClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

impl HttpAnswerClient {
    pub fn new(base_url: String, timeout: Option<Duration>) -> Result<Self, ServiceError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe `GET /health`
    pub async fn health(&self) -> Result<(), ServiceError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::InvalidResponse(format!(
                "health check returned {}",
                response.status()
            )));
        }

        let health: HealthResponse = response.json().await?;
        if health.status != "ok" {
            return Err(ServiceError::InvalidResponse(format!(
                "service reports status {:?}",
                health.status
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl AnswerService for HttpAnswerClient {
    async fn ask(&self, query: &str) -> Result<AskResponse, ServiceError> {
        let request = AskRequest {
            query: query.to_string(),
        };

        tracing::debug!(url = %self.base_url, "POST /ask");

        let response = self
            .client
            .post(format!("{}/ask", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::InvalidResponse(format!(
                "{}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ServiceError::InvalidResponse(format!("{}: {}", e, body)))
    }
}
