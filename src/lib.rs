//! Task Worker - a polling worker for a central task orchestrator
//!
//! The worker registers itself once, then repeatedly lists open tasks,
//! claims one, turns it into a completion summary and delivers the summary
//! back. Summaries come from a configurable execution provider:
//! - `echo` - a fixed template, always succeeds
//! - `ollama` / `llamacpp` - a local generation binary run as a subprocess
//! - `openclaw` - a remote agent reached over HTTP
//!
//! # Example
//! ```ignore
//! use task_worker::{TaskRunner, WorkerConfig};
//!
//! #[tokio::main]
//! async fn main() -> task_worker::Result<()> {
//!     let config = WorkerConfig::from_env()?;
//!     let runner = TaskRunner::from_config(config)?;
//!     runner.run().await
//! }
//! ```

pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod worker;

pub use error::{Result, WorkerError};
pub use executor::{build_prompt, ExecutionResult, Executor, Provider};
pub use orchestrator::{OrchestratorClient, Task, TaskStatus, WorkerIdentity};
pub use worker::{CycleOutcome, CyclePhase, TaskRunner, WorkerConfig, WorkerState};
