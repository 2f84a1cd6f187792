mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use chronologicon_compute::InsightService;
use chronologicon_core::config::{load_dotenv, Config};
use chronologicon_graph::get_timeline;
use chronologicon_ingest::{spawn_ingestion_job, wait_for_job, InMemoryJobStore, IngestionJob, JobStatus};
use chronologicon_storage::{EventStore, MemoryEventStore};

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let mut config = Config::from_env();
    let args = CliArgs::parse();

    // Initialize tracing; RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Some(batch_size) = args.batch_size {
        config.ingest.batch_size = batch_size.max(1);
    }
    config.log_summary();

    let store: Arc<dyn EventStore> = Arc::new(MemoryEventStore::new());
    let jobs = ingest_inputs(&args, &config, store.clone()).await?;

    let insights = InsightService::new(store.clone());
    match args.command {
        Command::Ingest => print_json(&jobs)?,
        Command::Gaps(w) => print_json(&insights.temporal_gaps(w.start, w.end).await?)?,
        Command::Overlaps(w) => print_json(&insights.overlapping_events(w.start, w.end).await?)?,
        Command::Path { source, target } => {
            print_json(&insights.event_influence(&source, &target).await?)?
        }
        Command::Timeline { event_id } => match get_timeline(store.as_ref(), &event_id).await? {
            Some(tree) => print_json(&tree)?,
            None => bail!("event '{event_id}' not found"),
        },
        Command::Search(search) => print_json(&store.search(&search.into_query()).await?)?,
    }

    Ok(())
}

/// Ingest every input concurrently and wait for all jobs to settle.
async fn ingest_inputs(
    args: &CliArgs,
    config: &Config,
    store: Arc<dyn EventStore>,
) -> Result<Vec<IngestionJob>> {
    let registry = Arc::new(InMemoryJobStore::new());
    let poll = Duration::from_millis(config.ingest.progress_poll_ms.max(1));

    let ids: Vec<_> = args
        .inputs
        .iter()
        .map(|path| {
            spawn_ingestion_job(
                registry.clone(),
                store.clone(),
                path.clone(),
                config.ingest.clone(),
            )
        })
        .collect();

    let mut jobs = Vec::with_capacity(ids.len());
    for id in ids {
        let job = wait_for_job(registry.as_ref(), id, poll)
            .await
            .with_context(|| format!("ingestion job {id} vanished from the registry"))?;

        if job.status == JobStatus::Failed {
            warn!(
                job_id = %job.job_id,
                source = %job.source_name,
                error = job.errors.last().map(String::as_str).unwrap_or(""),
                "ingestion failed"
            );
        } else {
            info!(
                job_id = %job.job_id,
                source = %job.source_name,
                processed = job.processed_lines,
                errors = job.error_lines,
                "ingestion finished"
            );
        }
        jobs.push(job);
    }

    info!(events = store.len().await?, "store ready");
    Ok(jobs)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize result")?;
    println!("{out}");
    Ok(())
}
