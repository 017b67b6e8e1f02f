mod error;
mod migration;
mod storage;
mod utils;

#[cfg(test)]
mod tests;

use clap::Parser;
use migration::{
    AlwaysYes, Confirm, ConsolePrompt, Migration, Scripted, StageOutcome, WorkflowReport,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::{DynamoDBStore, S3Store};
use utils::LogFormat;

/// Copy records updated in the trailing window, and their objects, from
/// production into staging.
#[derive(Debug, Parser)]
#[command(name = "stage-migrate", version)]
struct Cli {
    /// TOML config file (default: ./stage-migrate.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(long, conflicts_with = "answers")]
    yes: bool,

    /// Scripted answers in prompt order, e.g. "y,y,n,y,y"
    #[arg(long)]
    answers: Option<String>,

    /// Override the trailing window in days
    #[arg(long)]
    window_days: Option<u32>,

    /// Override where the export artifact is written
    #[arg(long)]
    artifact: Option<PathBuf>,

    /// Keep the export artifact after a successful run
    #[arg(long)]
    keep_artifact: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    /// Write run metrics in Prometheus text format to this file
    #[arg(long)]
    metrics_file: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut utils::Config) {
        if let Some(window_days) = self.window_days {
            config.window_days = window_days;
        }
        if let Some(artifact) = &self.artifact {
            config.artifact_path = artifact.clone();
        }
        if self.keep_artifact {
            config.keep_artifact = true;
        }
    }

    fn confirmation(&self) -> anyhow::Result<Box<dyn Confirm>> {
        if self.yes {
            return Ok(Box::new(AlwaysYes));
        }
        match &self.answers {
            Some(answers) => Ok(Box::new(
                Scripted::parse(answers).map_err(anyhow::Error::msg)?,
            )),
            None => Ok(Box::new(ConsolePrompt::stdio())),
        }
    }
}

/// Führt die Migration aus und schreibt die Metriken auch dann, wenn der Lauf scheitert
async fn run_migration(
    migration: &Migration,
    confirm: &mut dyn Confirm,
    metrics_file: Option<&Path>,
) -> anyhow::Result<WorkflowReport> {
    let result = migration.run(confirm).await;

    if let Some(path) = metrics_file {
        match migration.metrics().write_textfile(path) {
            Ok(()) => tracing::info!(path = %path.display(), "Metrics written"),
            Err(e) if result.is_err() => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to write metrics")
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(result?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = utils::Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    // Initialize logging
    let _guard = utils::init_logging(cli.log_format, config.log_dir.as_deref());

    tracing::info!(
        source_table = %config.source.table,
        destination_table = %config.destination.table,
        window_days = config.window_days,
        "Starting stage migration"
    );

    let mut confirm = cli.confirmation()?;

    // Initialize storage layer
    let source_sdk = storage::load_sdk_config(&config.source, config.timeout_ms).await;
    let destination_sdk = storage::load_sdk_config(&config.destination, config.timeout_ms).await;

    let migration = Migration::new(
        config,
        Arc::new(DynamoDBStore::new(&source_sdk)),
        Arc::new(DynamoDBStore::new(&destination_sdk)),
        Arc::new(S3Store::new(&source_sdk)),
        Arc::new(S3Store::new(&destination_sdk)),
    );

    let report = run_migration(&migration, confirm.as_mut(), cli.metrics_file.as_deref()).await?;

    for (stage, outcome) in &report.stages {
        match outcome {
            StageOutcome::Completed => {
                tracing::info!(run_id = %report.run_id, %stage, "Stage completed")
            }
            StageOutcome::Skipped => {
                tracing::info!(run_id = %report.run_id, %stage, "Stage skipped")
            }
        }
    }

    Ok(())
}
