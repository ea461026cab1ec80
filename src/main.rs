use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use umami_engine::{EngineConfig, ExecutionEngine};
use umami_pipeline::PipelineDefinition;
use umami_scheduler::{Schedule, Scheduler};
use umami_store::{FsStore, Store};

mod pipelines;
mod tasks;

use pipelines::{RECIPE_CRON, recipe_pipeline, recipe_seed};
use tasks::CommandInvoker;

/// Umami - a scheduled pipeline engine for generated content
#[derive(Parser)]
#[command(name = "umami")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.umami)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run one pipeline execution now
  Run {
    /// Path to a pipeline definition (JSON); defaults to the recipe preset
    #[arg(long)]
    pipeline: Option<PathBuf>,

    /// Seed the execution with DryRun=true (tasks should skip publishing)
    #[arg(long)]
    dry_run: bool,
  },

  /// Run the pipeline on its cron schedule until interrupted
  Schedule {
    /// Path to a pipeline definition (JSON); defaults to the recipe preset
    #[arg(long)]
    pipeline: Option<PathBuf>,

    /// Cron expression (seconds first); defaults to the recipe schedule
    #[arg(long)]
    cron: Option<String>,

    /// Seed every execution with DryRun=true
    #[arg(long)]
    dry_run: bool,
  },

  /// Work with stored artifacts
  Artifact {
    #[command(subcommand)]
    action: ArtifactAction,
  },
}

#[derive(Subcommand)]
enum ArtifactAction {
  /// Write an artifact's bytes to stdout
  Get { key: String },

  /// Store stdin's bytes under a key
  Put { key: String },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .init();

  let cli = Cli::parse();

  let data_dir = cli
    .data_dir
    .or_else(|| dirs::home_dir().map(|home| home.join(".umami")))
    .context("could not determine home directory")?;

  match cli.command {
    Some(Commands::Run { pipeline, dry_run }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run_once(pipeline, dry_run, data_dir))
    }
    Some(Commands::Schedule {
      pipeline,
      cron,
      dry_run,
    }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run_scheduled(pipeline, cron, dry_run, data_dir))
    }
    Some(Commands::Artifact { action }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run_artifact(action, data_dir))
    }
    None => {
      println!("umami - use --help to see available commands");
      Ok(())
    }
  }
}

async fn run_once(pipeline_file: Option<PathBuf>, dry_run: bool, data_dir: PathBuf) -> Result<()> {
  let pipeline = load_pipeline(pipeline_file).await?;
  let seed = read_seed_from_stdin()?.unwrap_or_else(|| recipe_seed(dry_run));
  let engine = build_engine(&data_dir);

  info!(pipeline_id = %pipeline.pipeline_id, dry_run, "run_started");
  let execution = engine
    .execute(&pipeline, seed, CancellationToken::new())
    .await;
  info!(
    execution_id = %execution.execution_id,
    status = ?execution.status,
    invocations = execution.invocations.len(),
    "run_finished"
  );

  println!("{}", serde_json::to_string_pretty(&execution)?);
  if !execution.succeeded() {
    std::process::exit(1);
  }
  Ok(())
}

async fn run_scheduled(
  pipeline_file: Option<PathBuf>,
  cron: Option<String>,
  dry_run: bool,
  data_dir: PathBuf,
) -> Result<()> {
  let pipeline = load_pipeline(pipeline_file).await?;
  let expr = cron.unwrap_or_else(|| RECIPE_CRON.to_string());
  let schedule = Schedule::parse(&expr)?;
  let engine = Arc::new(build_engine(&data_dir));
  info!(pipeline_id = %pipeline.pipeline_id, cron = %expr, dry_run, "schedule_starting");

  let scheduler = Scheduler::new(engine, pipeline, recipe_seed(dry_run), schedule);

  let cancel = CancellationToken::new();
  let loop_cancel = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      loop_cancel.cancel();
    }
  });

  scheduler.run(cancel).await;
  Ok(())
}

async fn run_artifact(action: ArtifactAction, data_dir: PathBuf) -> Result<()> {
  let store = FsStore::new(data_dir.join("artifacts"));
  match action {
    ArtifactAction::Get { key } => {
      let bytes = store
        .get(&key)
        .await
        .with_context(|| format!("failed to read artifact '{}'", key))?;
      io::stdout().write_all(&bytes)?;
    }
    ArtifactAction::Put { key } => {
      let mut bytes = Vec::new();
      io::stdin()
        .read_to_end(&mut bytes)
        .context("failed to read artifact from stdin")?;
      store
        .put(&key, bytes)
        .await
        .with_context(|| format!("failed to store artifact '{}'", key))?;
    }
  }
  Ok(())
}

fn build_engine(data_dir: &std::path::Path) -> ExecutionEngine {
  let invoker = CommandInvoker::new(data_dir.join("tasks"), data_dir.join("artifacts"));
  ExecutionEngine::new(Arc::new(invoker), EngineConfig::default())
}

async fn load_pipeline(pipeline_file: Option<PathBuf>) -> Result<PipelineDefinition> {
  let pipeline = match pipeline_file {
    Some(path) => {
      let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read pipeline file: {}", path.display()))?;
      serde_json::from_str(&content)
        .with_context(|| format!("failed to parse pipeline file: {}", path.display()))?
    }
    None => recipe_pipeline(),
  };
  pipeline.validate().context("invalid pipeline")?;
  Ok(pipeline)
}

/// Seed from a piped stdin, if any. `None` on a terminal or empty pipe.
fn read_seed_from_stdin() -> Result<Option<serde_json::Value>> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    return Ok(None);
  }
  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read seed from stdin")?;
  if input.trim().is_empty() {
    return Ok(None);
  }
  let seed = serde_json::from_str(&input).context("failed to parse seed JSON from stdin")?;
  Ok(Some(seed))
}
