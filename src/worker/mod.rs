//! Worker module for registering with the orchestrator and polling tasks
//!
//! This module provides:
//! - TaskRunner: Main worker loop that lists, claims, executes and delivers
//! - WorkerState: Explicit per-cycle state machine driven by the runner
//! - WorkerConfig: Configuration for the worker

pub mod config;
pub mod state;
pub mod task_runner;

pub use config::{WorkerConfig, WorkerConfigBuilder};
pub use state::{CycleOutcome, CyclePhase, WorkerState};
pub use task_runner::{setup_signal_handler, TaskRunner};
