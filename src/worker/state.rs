//! Poll-cycle state machine

use crate::executor::ExecutionResult;
use crate::orchestrator::Task;
use std::fmt;

/// Where the worker is within a poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Listing,
    Claiming,
    Executing,
    Delivering,
    Sleeping,
}

impl CyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CyclePhase::Idle => "idle",
            CyclePhase::Listing => "listing",
            CyclePhase::Claiming => "claiming",
            CyclePhase::Executing => "executing",
            CyclePhase::Delivering => "delivering",
            CyclePhase::Sleeping => "sleeping",
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The list held no task with status `open`
    NoOpenTask,
    /// The orchestrator refused our claim
    ClaimRejected { task_id: String },
    /// A summary was delivered
    Delivered { task_id: String, summary: String },
    /// A phase failed; the cycle was abandoned
    Failed { phase: CyclePhase, error: String },
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::NoOpenTask => write!(f, "no open task"),
            CycleOutcome::ClaimRejected { task_id } => write!(f, "claim rejected for task {}", task_id),
            CycleOutcome::Delivered { task_id, .. } => write!(f, "delivered task {}", task_id),
            CycleOutcome::Failed { phase, error } => write!(f, "{} failed: {}", phase, error),
        }
    }
}

/// Worker state; each variant carries what the next phase needs
///
/// Idle -> Listing -> Claiming -> Executing -> Delivering -> Sleeping -> Idle,
/// with early exits to Sleeping when there is nothing to do or a phase fails.
#[derive(Debug, Clone)]
pub enum WorkerState {
    Idle,
    Listing,
    Claiming(Task),
    Executing(Task),
    Delivering { task: Task, result: ExecutionResult },
    Sleeping(CycleOutcome),
}

impl WorkerState {
    pub fn phase(&self) -> CyclePhase {
        match self {
            WorkerState::Idle => CyclePhase::Idle,
            WorkerState::Listing => CyclePhase::Listing,
            WorkerState::Claiming(_) => CyclePhase::Claiming,
            WorkerState::Executing(_) => CyclePhase::Executing,
            WorkerState::Delivering { .. } => CyclePhase::Delivering,
            WorkerState::Sleeping(_) => CyclePhase::Sleeping,
        }
    }
}
