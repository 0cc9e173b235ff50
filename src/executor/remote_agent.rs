//! Remote agent client (OpenClaw-compatible `POST /agent/run`)

use crate::error::{Result, WorkerError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Summary used when the agent answers without a message
pub const DEFAULT_AGENT_SUMMARY: &str = "OpenClaw completed task.";

#[derive(Debug, Clone, Serialize)]
struct AgentRunRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct AgentRunResponse {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for a remote text-generation agent
#[derive(Debug, Clone)]
pub struct RemoteAgentClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl RemoteAgentClient {
    /// Create a client; an empty `api_key` sends no Authorization header
    pub fn new(base_url: &str, api_key: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| WorkerError::RequestError {
            endpoint: "client_init".to_string(),
            source: e,
        })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: Some(api_key.to_string()).filter(|k| !k.is_empty()),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send `prompt` to the agent and return its reply
    pub async fn run(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/agent/run", self.base_url);
        debug!("Calling remote agent at {}", url);

        let mut request = self.client.post(&url).json(&AgentRunRequest { message: prompt });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WorkerError::RemoteAgentError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::RemoteAgentError(format!(
                "status {}",
                status.as_u16()
            )));
        }

        let body: AgentRunResponse = response
            .json()
            .await
            .map_err(|e| WorkerError::RemoteAgentError(format!("Failed to parse response: {}", e)))?;

        Ok(body
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AGENT_SUMMARY.to_string()))
    }
}
