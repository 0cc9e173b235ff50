//! Task Worker CLI
//!
//! Registers with the orchestrator and works through open tasks. Besides the
//! worker loop there are a few one-shot commands for poking at an orchestrator
//! or trying an execution provider locally.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use task_worker::orchestrator::TaskStatus;
use task_worker::worker::setup_signal_handler;
use task_worker::{
    CycleOutcome, Executor, OrchestratorClient, Provider, Task, TaskRunner, WorkerConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "task-worker")]
#[command(about = "Poll an orchestrator for open tasks and deliver completion summaries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Register and run the polling loop
    Run {
        /// Run a single cycle and exit (for testing)
        #[arg(long)]
        once: bool,

        /// Poll interval in milliseconds (overrides POLL_INTERVAL_MS)
        #[arg(short, long)]
        poll_interval_ms: Option<u64>,

        /// Execution provider: echo, ollama, llamacpp, openclaw (overrides LLM_PROVIDER)
        #[arg(long)]
        provider: Option<Provider>,
    },

    /// Register with the orchestrator and print the assigned id
    Register,

    /// List orchestrator tasks
    Tasks {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check orchestrator health
    Health,

    /// Run the configured execution provider on an ad-hoc task
    Execute {
        /// Task title
        #[arg(long)]
        title: String,

        /// Task description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Task id used in the summary
        #[arg(long, default_value = "local")]
        task_id: String,

        /// Execution provider (overrides LLM_PROVIDER)
        #[arg(long)]
        provider: Option<Provider>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = WorkerConfig::from_env().context("Invalid worker configuration")?;

    match cli.command {
        Commands::Run {
            once,
            poll_interval_ms,
            provider,
        } => {
            let mut builder = config.into_builder();
            if let Some(ms) = poll_interval_ms {
                builder = builder.poll_interval_ms(ms);
            }
            if let Some(provider) = provider {
                builder = builder.provider(provider);
            }
            let config = builder.build();
            config.validate()?;

            info!("Initializing worker...");
            let runner = TaskRunner::from_config(config)?;

            if once {
                let outcome = runner
                    .run_once()
                    .await
                    .context("Worker failed to start")?;
                println!("{}", outcome);
                if let CycleOutcome::Failed { .. } = outcome {
                    bail!("cycle failed");
                }
            } else {
                // Setup graceful shutdown
                setup_signal_handler(runner.shutdown_handle());

                runner.run().await.context("Worker stopped with an error")?;
            }
        }

        Commands::Register => {
            let runner = TaskRunner::from_config(config)?;
            let identity = runner.register().await.context("Registration failed")?;
            println!("{}", identity.id);
        }

        Commands::Tasks { json } => {
            let client = orchestrator_client(&config)?;
            let tasks = client.list_tasks().await.context("Failed to list tasks")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                println!("=== Tasks ({}) ===", tasks.len());
                for task in &tasks {
                    println!(
                        "  - [{}] {} {}{}",
                        task.status,
                        task.id,
                        task.title,
                        task.assignee
                            .as_deref()
                            .map(|a| format!(" (assignee: {})", a))
                            .unwrap_or_default()
                    );
                }
                let open = tasks.iter().filter(|t| t.is_open()).count();
                println!("\n{} open", open);
            }
        }

        Commands::Health => {
            let client = orchestrator_client(&config)?;
            let healthy = client.health().await.context("Health check failed")?;
            if !healthy {
                bail!("orchestrator at {} reports unhealthy", client.base_url());
            }
            println!("ok");
        }

        Commands::Execute {
            title,
            description,
            task_id,
            provider,
        } => {
            let mut config = config;
            if let Some(provider) = provider {
                config = config.into_builder().provider(provider).build();
            }
            config.validate()?;
            let executor = Executor::from_config(&config)?;

            let task = Task {
                id: task_id,
                title,
                description,
                status: TaskStatus::Assigned,
                project_id: None,
                assignee: None,
                delivery_summary: None,
            };
            let result = executor.execute(&task).await;
            println!("{}", result.summary);
        }
    }

    Ok(())
}

fn orchestrator_client(config: &WorkerConfig) -> Result<OrchestratorClient> {
    Ok(OrchestratorClient::new(
        &config.orchestrator_url,
        &config.orchestrator_api_key,
        config.request_timeout,
    )?)
}
