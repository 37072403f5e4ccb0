//! Cron-driven daily jobs.
//!
//! Registers the advance job (window advance followed by the daily refresh)
//! and the hours job, then runs until ctrl-c.

use std::sync::Arc;

use anyhow::Context;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::run::{self, Operation, RunContext};

/// 05:00 every day.
pub(crate) const DEFAULT_ADVANCE_CRON: &str = "0 0 5 * * *";
/// 05:15 every day, after the advance job has usually finished.
pub(crate) const DEFAULT_HOURS_CRON: &str = "0 15 5 * * *";

pub(crate) async fn run(ctx: Arc<RunContext>, advance_cron: &str, hours_cron: &str) -> anyhow::Result<()> {
    let mut scheduler = JobScheduler::new().await.context("failed to create scheduler")?;

    register_job(&scheduler, Arc::clone(&ctx), advance_cron, &[Operation::Advance, Operation::Today])
        .await
        .with_context(|| format!("invalid advance cron: {advance_cron}"))?;
    register_job(&scheduler, ctx, hours_cron, &[Operation::Hours])
        .await
        .with_context(|| format!("invalid hours cron: {hours_cron}"))?;

    scheduler.start().await.context("failed to start scheduler")?;
    tracing::info!("scheduler: running, press ctrl-c to stop");

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    tracing::info!("scheduler: shutting down");
    scheduler.shutdown().await.context("scheduler shutdown failed")?;
    Ok(())
}

/// Register a job that runs `operations` in order against the current date.
///
/// A failed operation is logged and does not stop the ones after it.
async fn register_job(
    scheduler: &JobScheduler,
    ctx: Arc<RunContext>,
    cron: &str,
    operations: &'static [Operation],
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let ctx = Arc::clone(&ctx);

        Box::pin(async move {
            let date = chrono::Local::now().date_naive();
            for &operation in operations {
                tracing::info!(operation = operation.as_str(), %date, "scheduler: starting run");
                match run::execute(&ctx, operation, date).await {
                    Ok(summary) => match serde_json::to_string(&summary) {
                        Ok(json) => tracing::info!(operation = operation.as_str(), summary = %json, "scheduler: run complete"),
                        Err(e) => tracing::warn!(error = %e, "scheduler: failed to encode summary"),
                    },
                    Err(e) => tracing::error!(
                        operation = operation.as_str(),
                        %date,
                        class = e.class_name(),
                        error = %e,
                        "scheduler: run failed"
                    ),
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, ?operations, "scheduler: registered job");
    Ok(())
}
