//! Cron-driven runs.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tweetsink_core::AppConfig;
use tweetsink_pipeline::TriggerPayload;

use crate::run::run_once;

/// Registers the ingest job on `cron` and runs until Ctrl-C.
///
/// Overlapping ticks are not serialized: a run that outlasts the interval
/// overlaps the next one.
pub(crate) async fn run_scheduled(cron: &str, config: Arc<AppConfig>) -> anyhow::Result<()> {
    let mut scheduler = build_scheduler(cron, config).await?;
    tracing::info!(cron, "scheduler started; waiting for Ctrl-C");

    tokio::signal::ctrl_c().await?;
    tracing::info!("received shutdown signal, stopping scheduler");
    scheduler.shutdown().await?;
    Ok(())
}

/// Builds and starts a scheduler with the ingest job registered.
///
/// The returned handle must be kept alive; dropping it stops the job.
async fn build_scheduler(
    cron: &str,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting ingest run");
            match run_once(&config, &TriggerPayload::default()).await {
                Ok(summary) => tracing::info!(
                    run_id = %summary.run_id,
                    status = %summary.status,
                    rows_eligible = summary.rows_eligible,
                    "scheduler: ingest run complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: ingest run failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    Ok(scheduler)
}
