//! Execution strategies that turn a claimed task into a completion summary
//!
//! The strategy is picked once at startup from [`Provider`]. Whatever happens
//! underneath, [`Executor::execute`] always yields a non-empty summary: back-end
//! failures are folded into an annotated fallback instead of being returned.

pub mod remote_agent;
pub mod subprocess;

pub use remote_agent::{RemoteAgentClient, DEFAULT_AGENT_SUMMARY};
pub use subprocess::{run_command, SubprocessExecutor, SubprocessFlavor};

use crate::error::{Result, WorkerError};
use crate::orchestrator::Task;
use crate::worker::WorkerConfig;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Configured execution provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Echo,
    Ollama,
    LlamaCpp,
    RemoteAgent,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Echo => "echo",
            Provider::Ollama => "ollama",
            Provider::LlamaCpp => "llamacpp",
            Provider::RemoteAgent => "openclaw",
        }
    }
}

impl FromStr for Provider {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "echo" => Ok(Provider::Echo),
            "ollama" => Ok(Provider::Ollama),
            "llamacpp" | "llama.cpp" | "llama-cpp" => Ok(Provider::LlamaCpp),
            "openclaw" | "remote-agent" | "remote" => Ok(Provider::RemoteAgent),
            other => Err(WorkerError::ConfigError(format!(
                "unknown provider '{}' (expected echo, ollama, llamacpp or openclaw)",
                other
            ))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub summary: String,
}

#[derive(Debug, Clone)]
enum Strategy {
    Echo,
    Subprocess(SubprocessExecutor),
    RemoteAgent(RemoteAgentClient),
}

/// Execution strategy bound to this worker's name
#[derive(Debug, Clone)]
pub struct Executor {
    worker_name: String,
    strategy: Strategy,
}

impl Executor {
    /// Echo-only executor
    pub fn echo(worker_name: &str) -> Self {
        Self {
            worker_name: worker_name.to_string(),
            strategy: Strategy::Echo,
        }
    }

    pub fn subprocess(worker_name: &str, executor: SubprocessExecutor) -> Self {
        Self {
            worker_name: worker_name.to_string(),
            strategy: Strategy::Subprocess(executor),
        }
    }

    pub fn remote_agent(worker_name: &str, client: RemoteAgentClient) -> Self {
        Self {
            worker_name: worker_name.to_string(),
            strategy: Strategy::RemoteAgent(client),
        }
    }

    /// Build the executor selected by `config.provider`
    pub fn from_config(config: &WorkerConfig) -> Result<Self> {
        let name = &config.worker_name;
        let executor = match config.provider {
            Provider::Echo => Self::echo(name),
            Provider::Ollama | Provider::LlamaCpp => {
                let flavor = if config.provider == Provider::Ollama {
                    SubprocessFlavor::Ollama
                } else {
                    SubprocessFlavor::LlamaCpp
                };
                if config.llm_model.is_empty() {
                    warn!("LLM_MODEL is empty; {} will be invoked without a model", flavor.default_program());
                }
                Self::subprocess(
                    name,
                    SubprocessExecutor::new(flavor, &config.llm_bin, &config.llm_model, config.llm_timeout),
                )
            }
            Provider::RemoteAgent => Self::remote_agent(
                name,
                RemoteAgentClient::new(&config.openclaw_url, &config.openclaw_api_key, config.llm_timeout)?,
            ),
        };

        info!("Execution provider: {}", config.provider);
        Ok(executor)
    }

    pub fn provider(&self) -> Provider {
        match &self.strategy {
            Strategy::Echo => Provider::Echo,
            Strategy::Subprocess(s) => match s.flavor() {
                SubprocessFlavor::Ollama => Provider::Ollama,
                SubprocessFlavor::LlamaCpp => Provider::LlamaCpp,
            },
            Strategy::RemoteAgent(_) => Provider::RemoteAgent,
        }
    }

    /// Produce a summary for `task`; never fails
    pub async fn execute(&self, task: &Task) -> ExecutionResult {
        let prompt = build_prompt(task);

        let generated = match &self.strategy {
            Strategy::Echo => {
                return ExecutionResult {
                    summary: echo_summary(&self.worker_name, &task.id),
                }
            }
            Strategy::Subprocess(executor) => executor.run(&prompt).await,
            Strategy::RemoteAgent(client) => client.run(&prompt).await,
        };

        let summary = match generated {
            Ok(summary) => summary,
            Err(e) => {
                warn!(task_id = %task.id, provider = %self.provider(), "Execution failed, using fallback summary: {}", e);
                fallback_summary(&self.worker_name, &task.id, &e.to_string())
            }
        };

        ExecutionResult { summary }
    }
}

/// Prompt handed to generation back-ends
pub fn build_prompt(task: &Task) -> String {
    format!(
        "Task: {}\n\nDescription: {}\n\nProvide a short completion summary.",
        task.title, task.description
    )
}

fn base_summary(worker_name: &str, task_id: &str) -> String {
    format!("Worker {} completed task {}", worker_name, task_id)
}

pub fn echo_summary(worker_name: &str, task_id: &str) -> String {
    format!("{}. (echo mode)", base_summary(worker_name, task_id))
}

pub fn fallback_summary(worker_name: &str, task_id: &str, detail: &str) -> String {
    format!("{}. (llm error: {})", base_summary(worker_name, task_id), detail)
}
