//! Task runner - main worker loop

use crate::error::Result;
use crate::executor::Executor;
use crate::orchestrator::{first_open_task, OrchestratorClient, Task, TaskStatus, WorkerIdentity};
use crate::worker::state::{CycleOutcome, WorkerState};
use crate::worker::WorkerConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Task runner that polls the orchestrator and works one task at a time
pub struct TaskRunner {
    client: OrchestratorClient,
    config: WorkerConfig,
    executor: Executor,
    shutdown: Arc<AtomicBool>,
}

impl TaskRunner {
    /// Create a new task runner
    pub fn new(client: OrchestratorClient, config: WorkerConfig, executor: Executor) -> Self {
        Self {
            client,
            config,
            executor,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Build client and executor from config
    pub fn from_config(config: WorkerConfig) -> Result<Self> {
        let client = OrchestratorClient::new(
            &config.orchestrator_url,
            &config.orchestrator_api_key,
            config.request_timeout,
        )?;
        let executor = Executor::from_config(&config)?;
        Ok(Self::new(client, config, executor))
    }

    /// Get a handle to signal shutdown
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn client(&self) -> &OrchestratorClient {
        &self.client
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Register with the orchestrator
    ///
    /// Any error here is fatal for the process: there is no way to claim
    /// tasks without an identity.
    pub async fn register(&self) -> Result<WorkerIdentity> {
        let identity = self
            .client
            .register(&self.config.worker_name, &self.config.capabilities)
            .await?;
        info!(
            worker_id = %identity.id,
            "Registered worker {} with capabilities {:?}",
            identity.name, identity.capabilities
        );
        Ok(identity)
    }

    /// Register, then poll until shutdown is signaled
    pub async fn run(&self) -> Result<()> {
        let identity = self.register().await?;
        self.run_with_identity(&identity).await
    }

    /// Main worker loop
    ///
    /// Only an authorization failure ends the loop early; every other
    /// cycle error is logged and the worker sleeps as usual.
    pub async fn run_with_identity(&self, identity: &WorkerIdentity) -> Result<()> {
        info!("Starting task worker {}...", identity.name);
        info!("Orchestrator: {}", self.client.base_url());
        info!("Poll interval: {:?}", self.config.poll_interval);
        info!("Provider: {}", self.executor.provider());

        let mut state = WorkerState::Idle;
        loop {
            // Check for shutdown signal between transitions
            if self.shutdown.load(Ordering::Relaxed) {
                info!("Shutdown signal received, stopping worker...");
                break;
            }

            state = self.step(state, identity).await?;
        }

        info!("Worker stopped");
        Ok(())
    }

    /// Run one cycle from listing through delivery, without the trailing sleep
    pub async fn run_cycle(&self, identity: &WorkerIdentity) -> Result<CycleOutcome> {
        let mut state = WorkerState::Listing;
        loop {
            state = self.step(state, identity).await?;
            if let WorkerState::Sleeping(outcome) = state {
                return Ok(outcome);
            }
        }
    }

    /// Register and run a single cycle (for `--once`)
    pub async fn run_once(&self) -> Result<CycleOutcome> {
        info!("Running worker in single-cycle mode...");
        let identity = self.register().await?;
        self.run_cycle(&identity).await
    }

    /// Advance the state machine by one transition
    ///
    /// Phase errors are contained here and turned into `Sleeping(Failed)`.
    /// Only unauthorized responses escape.
    pub async fn step(&self, state: WorkerState, identity: &WorkerIdentity) -> Result<WorkerState> {
        let phase = state.phase();

        match self.transition(state, identity).await {
            Ok(next) => {
                if let WorkerState::Sleeping(outcome) = &next {
                    log_outcome(outcome);
                }
                Ok(next)
            }
            Err(e) if e.is_unauthorized() => {
                error!(phase = %phase, "Orchestrator rejected credentials: {}", e);
                Err(e)
            }
            Err(e) => {
                error!(phase = %phase, "Worker cycle failed: {}", e);
                Ok(WorkerState::Sleeping(CycleOutcome::Failed {
                    phase,
                    error: e.to_string(),
                }))
            }
        }
    }

    async fn transition(&self, state: WorkerState, identity: &WorkerIdentity) -> Result<WorkerState> {
        match state {
            WorkerState::Idle => Ok(WorkerState::Listing),

            WorkerState::Listing => {
                let tasks = self.client.list_tasks().await?;
                match first_open_task(tasks) {
                    Some(task) => Ok(WorkerState::Claiming(task)),
                    None => Ok(WorkerState::Sleeping(CycleOutcome::NoOpenTask)),
                }
            }

            WorkerState::Claiming(task) => {
                if !self.client.assign_task(&task.id, &identity.id).await? {
                    return Ok(WorkerState::Sleeping(CycleOutcome::ClaimRejected {
                        task_id: task.id,
                    }));
                }

                info!(task_id = %task.id, "Claimed task: {}", task.title);
                if self.config.report_progress {
                    self.report_progress(&task).await;
                }
                Ok(WorkerState::Executing(task))
            }

            WorkerState::Executing(task) => {
                let result = self.executor.execute(&task).await;
                debug!(task_id = %task.id, "Execution produced {} chars", result.summary.len());
                Ok(WorkerState::Delivering { task, result })
            }

            WorkerState::Delivering { task, result } => {
                let response = self.client.deliver(&task.id, &result.summary).await?;
                if response.get("ok").and_then(serde_json::Value::as_bool) == Some(false) {
                    warn!(task_id = %task.id, "Orchestrator did not accept the delivery");
                }
                Ok(WorkerState::Sleeping(CycleOutcome::Delivered {
                    task_id: task.id,
                    summary: result.summary,
                }))
            }

            WorkerState::Sleeping(_) => {
                sleep(self.config.poll_interval).await;
                Ok(WorkerState::Idle)
            }
        }
    }

    /// Best-effort `in_progress` report; never fails the cycle
    async fn report_progress(&self, task: &Task) {
        match self.client.update_status(&task.id, TaskStatus::InProgress).await {
            Ok(true) => debug!(task_id = %task.id, "Marked task in_progress"),
            Ok(false) => warn!(task_id = %task.id, "Orchestrator refused in_progress status"),
            Err(e) => warn!(task_id = %task.id, "Failed to report progress: {}", e),
        }
    }
}

fn log_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::NoOpenTask => debug!("No open tasks"),
        CycleOutcome::ClaimRejected { task_id } => {
            info!(task_id = %task_id, "Claim rejected, another worker got it first")
        }
        CycleOutcome::Delivered { task_id, .. } => info!(task_id = %task_id, "Task delivered"),
        // already logged at the failing step
        CycleOutcome::Failed { .. } => {}
    }
}

/// Setup signal handlers for graceful shutdown
pub fn setup_signal_handler(shutdown: Arc<AtomicBool>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, initiating shutdown...");
                shutdown.store(true, Ordering::Relaxed);
            }
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
        }
    });
}
