//! REST API client for the orchestrator

use super::models::{
    AckResponse, AssignTaskRequest, DeliverRequest, IntakeTaskRequest, IntakeTaskResponse,
    RegisterBotRequest, RegisterBotResponse, Task, TaskStatus, UpdateStatusRequest,
    WorkerIdentity,
};
use crate::error::{Result, WorkerError};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Longest error body we keep around for log lines
const MAX_ERROR_BODY: usize = 200;

/// HTTP client for the orchestrator API
///
/// Every request carries `Authorization: Bearer <api key>`.
#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OrchestratorClient {
    /// Create a new orchestrator client
    ///
    /// # Arguments
    /// * `base_url` - Orchestrator root, e.g. `http://localhost:3000`
    /// * `api_key` - Bearer token sent with every request
    /// * `timeout` - Per-request timeout, `None` to wait indefinitely
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
            api_key: api_key.to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<bool> {
        let request = self.client.get(self.url("/health"));
        let ack: AckResponse = self.send("/health", request).await?;
        Ok(ack.ok)
    }

    /// `POST /bots/register` and return the assigned identity
    pub async fn register(&self, name: &str, capabilities: &[String]) -> Result<WorkerIdentity> {
        let body = RegisterBotRequest {
            name: name.to_string(),
            capabilities: capabilities.to_vec(),
        };
        let request = self.client.post(self.url("/bots/register")).json(&body);
        let response: RegisterBotResponse = self.send("/bots/register", request).await?;

        match response.id {
            Some(id) if !id.is_empty() => Ok(WorkerIdentity {
                id,
                name: body.name,
                capabilities: body.capabilities,
            }),
            _ => Err(WorkerError::MalformedResponse {
                endpoint: "/bots/register".to_string(),
                reason: "missing worker id".to_string(),
            }),
        }
    }

    /// `GET /tasks`
    ///
    /// Entries that don't look like a task are skipped so one bad row
    /// cannot hide the rest of the queue.
    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let request = self.client.get(self.url("/tasks"));
        let entries: Vec<serde_json::Value> = self.send("/tasks", request).await?;
        let total = entries.len();

        let tasks: Vec<Task> = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Task>(entry.clone()) {
                Ok(task) => Some(task),
                Err(e) => {
                    debug!("Skipping malformed task entry {}: {}", entry, e);
                    None
                }
            })
            .collect();

        debug!("Orchestrator returned {} tasks ({} usable)", total, tasks.len());
        Ok(tasks)
    }

    /// `POST /tasks/assign`
    ///
    /// Returns whether the orchestrator granted the claim.
    pub async fn assign_task(&self, task_id: &str, bot_id: &str) -> Result<bool> {
        let body = AssignTaskRequest {
            task_id: task_id.to_string(),
            bot_id: bot_id.to_string(),
        };
        let request = self.client.post(self.url("/tasks/assign")).json(&body);
        let ack: AckResponse = self.send("/tasks/assign", request).await?;
        Ok(ack.ok)
    }

    /// `POST /tasks/status`
    pub async fn update_status(&self, task_id: &str, status: TaskStatus) -> Result<bool> {
        let body = UpdateStatusRequest {
            task_id: task_id.to_string(),
            status,
        };
        let request = self.client.post(self.url("/tasks/status")).json(&body);
        let ack: AckResponse = self.send("/tasks/status", request).await?;
        Ok(ack.ok)
    }

    /// `POST /deliver`
    ///
    /// The body is returned as-is; callers only inspect it for logging.
    pub async fn deliver(&self, task_id: &str, summary: &str) -> Result<serde_json::Value> {
        let body = DeliverRequest {
            task_id: task_id.to_string(),
            summary: summary.to_string(),
        };
        let request = self.client.post(self.url("/deliver")).json(&body);
        self.send("/deliver", request).await
    }

    /// `POST /tasks/intake` and return the new task id
    pub async fn intake_task(
        &self,
        project_id: &str,
        title: &str,
        description: &str,
    ) -> Result<String> {
        let body = IntakeTaskRequest {
            project_id: project_id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
        };
        let request = self.client.post(self.url("/tasks/intake")).json(&body);
        let response: IntakeTaskResponse = self.send("/tasks/intake", request).await?;
        Ok(response.id)
    }

    async fn send<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| WorkerError::RequestError {
                endpoint: endpoint.to_string(),
                source: e,
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(WorkerError::Unauthorized {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_chars(&mut body, MAX_ERROR_BODY);
            return Err(WorkerError::HttpStatusError {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| WorkerError::RequestError {
                endpoint: endpoint.to_string(),
                source: e,
            })?;

        serde_json::from_str(&text).map_err(|e| WorkerError::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

fn truncate_chars(text: &mut String, max: usize) {
    if let Some((idx, _)) = text.char_indices().nth(max) {
        text.truncate(idx);
        text.push('…');
    }
}
