//! Error types for task-worker

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Request to {endpoint} failed")]
    RequestError {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} from {endpoint}: {body}")]
    HttpStatusError {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Unauthorized ({status}) from {endpoint}: check ORCH_API_KEY")]
    Unauthorized { endpoint: String, status: u16 },

    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to spawn {program}: {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    CommandFailed(String),

    #[error("Command produced no output")]
    EmptyOutput,

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Remote agent error: {0}")]
    RemoteAgentError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl WorkerError {
    /// Whether the orchestrator refused our credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, WorkerError::Unauthorized { .. })
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;
