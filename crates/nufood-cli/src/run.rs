//! Executes one pipeline operation, with optional strategy fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use nufood_core::{AppConfig, LocationConfig, MemoryStore, MenuStore, StrategyKind};
use nufood_scraper::{
    build_strategy, AcquisitionStrategy, AdvanceSummary, DailySummary, HoursSummary, Orchestrator, RebuildSummary,
    RetryPolicy, ScraperError,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Rebuild,
    Advance,
    Today,
    Hours,
}

impl Operation {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Operation::Rebuild => "rebuild",
            Operation::Advance => "advance",
            Operation::Today => "today",
            Operation::Hours => "hours",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub(crate) enum RunSummary {
    Rebuild(RebuildSummary),
    Advance(AdvanceSummary),
    Today(DailySummary),
    Hours(HoursSummary),
}

/// Turns a [`StrategyKind`] into a ready acquisition strategy.
#[async_trait]
pub(crate) trait StrategySource: Send + Sync {
    async fn build(
        &self,
        kind: StrategyKind,
        config: &AppConfig,
        locations: &[LocationConfig],
    ) -> Result<Arc<dyn AcquisitionStrategy>, ScraperError>;
}

/// Builds the real HTTP and browser-backed strategies.
pub(crate) struct LiveStrategies;

#[async_trait]
impl StrategySource for LiveStrategies {
    async fn build(
        &self,
        kind: StrategyKind,
        config: &AppConfig,
        locations: &[LocationConfig],
    ) -> Result<Arc<dyn AcquisitionStrategy>, ScraperError> {
        build_strategy(kind, config, locations).await
    }
}

/// Everything a run needs besides the operation and date.
pub(crate) struct RunContext {
    pub config: AppConfig,
    pub locations: Vec<LocationConfig>,
    pub store: Arc<dyn MenuStore>,
    /// Set when the store is an in-memory dry-run store.
    pub dry_run_store: Option<Arc<MemoryStore>>,
    pub strategies: Arc<dyn StrategySource>,
    pub strategy: StrategyKind,
    pub fallback: Option<StrategyKind>,
    pub max_attempts: u32,
}

impl RunContext {
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.config.retry_backoff_secs))
    }

    async fn orchestrator(&self, kind: StrategyKind) -> Result<Orchestrator, ScraperError> {
        let strategy = self.strategies.build(kind, &self.config, &self.locations).await?;
        Ok(Orchestrator::new(
            strategy,
            Arc::clone(&self.store),
            self.locations.clone(),
            self.retry_policy(),
            self.config.window_days,
        ))
    }
}

async fn run_once(orchestrator: &Orchestrator, operation: Operation, date: NaiveDate) -> Result<RunSummary, ScraperError> {
    Ok(match operation {
        Operation::Rebuild => RunSummary::Rebuild(orchestrator.rebuild_window(date).await?),
        Operation::Advance => RunSummary::Advance(orchestrator.advance_window(date).await?),
        Operation::Today => RunSummary::Today(orchestrator.refresh_daily(date).await?),
        Operation::Hours => RunSummary::Hours(orchestrator.refresh_hours(date).await?),
    })
}

/// Runs `operation` with the primary strategy and, if that ends in an
/// anti-bot challenge or no data at all, once more with the fallback.
///
/// # Errors
///
/// Returns the error of the last strategy tried.
pub(crate) async fn execute(ctx: &RunContext, operation: Operation, date: NaiveDate) -> Result<RunSummary, ScraperError> {
    tracing::info!(operation = operation.as_str(), %date, strategy = %ctx.strategy, "run starting");

    let primary = ctx.orchestrator(ctx.strategy).await?;
    let err = match run_once(&primary, operation, date).await {
        Ok(summary) => return Ok(summary),
        Err(err) => err,
    };
    drop(primary);

    let Some(fallback) = ctx.fallback.filter(|f| *f != ctx.strategy) else {
        return Err(err);
    };
    if !err.warrants_fallback() {
        return Err(err);
    }

    tracing::warn!(
        operation = operation.as_str(),
        %date,
        from = %ctx.strategy,
        to = %fallback,
        class = err.class_name(),
        error = %err,
        "primary strategy failed, falling back"
    );
    let secondary = ctx.orchestrator(fallback).await?;
    run_once(&secondary, operation, date).await
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
