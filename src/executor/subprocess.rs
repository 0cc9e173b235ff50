//! Subprocess-backed generation (ollama / llama.cpp style binaries)

use crate::error::{Result, WorkerError};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Which command-line shape the binary expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubprocessFlavor {
    /// `ollama run <model> <prompt>`
    Ollama,
    /// `./main -m <model> -p <prompt>`
    LlamaCpp,
}

impl SubprocessFlavor {
    pub fn default_program(&self) -> &'static str {
        match self {
            SubprocessFlavor::Ollama => "ollama",
            SubprocessFlavor::LlamaCpp => "./main",
        }
    }

    pub fn args(&self, model: &str, prompt: &str) -> Vec<String> {
        match self {
            SubprocessFlavor::Ollama => {
                vec!["run".to_string(), model.to_string(), prompt.to_string()]
            }
            SubprocessFlavor::LlamaCpp => vec![
                "-m".to_string(),
                model.to_string(),
                "-p".to_string(),
                prompt.to_string(),
            ],
        }
    }
}

/// Runs a local text-generation binary and captures its stdout
#[derive(Debug, Clone)]
pub struct SubprocessExecutor {
    flavor: SubprocessFlavor,
    program: String,
    model: String,
    timeout: Option<Duration>,
}

impl SubprocessExecutor {
    /// Create an executor; an empty `program` falls back to the flavor default
    pub fn new(flavor: SubprocessFlavor, program: &str, model: &str, timeout: Option<Duration>) -> Self {
        let program = if program.is_empty() {
            flavor.default_program().to_string()
        } else {
            program.to_string()
        };

        Self {
            flavor,
            program,
            model: model.to_string(),
            timeout,
        }
    }

    pub fn flavor(&self) -> SubprocessFlavor {
        self.flavor
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub async fn run(&self, prompt: &str) -> Result<String> {
        let args = self.flavor.args(&self.model, prompt);
        run_command(&self.program, &args, self.timeout).await
    }
}

/// Run `program` to completion and return its trimmed stdout
///
/// stdin is closed, stdout/stderr are buffered until exit. A non-zero exit
/// becomes [`WorkerError::CommandFailed`] carrying stderr (or the exit code
/// when stderr is empty). On timeout the child is killed.
pub async fn run_command(program: &str, args: &[String], timeout: Option<Duration>) -> Result<String> {
    debug!("Spawning {} with {} args", program, args.len());

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| WorkerError::SpawnError {
            program: program.to_string(),
            source: e,
        })?;

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| WorkerError::Timeout(limit))??,
        None => child.wait_with_output().await?,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let detail = if stderr.is_empty() {
            match output.status.code() {
                Some(code) => format!("Command failed: {}", code),
                None => "Command failed: terminated by signal".to_string(),
            }
        } else {
            stderr
        };
        return Err(WorkerError::CommandFailed(detail));
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        return Err(WorkerError::EmptyOutput);
    }

    Ok(stdout)
}
