//! Per-date acquisition across every location, and the hand-off of the
//! aggregated result to the window, the daily table and the unique-name set.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, NaiveDate};
use futures::stream::{self, StreamExt};
use nufood_core::{AdvanceReport, LocationConfig, MenuItem, MenuStore, UniqueItemName};
use serde::Serialize;

use crate::dedup::net_new_names;
use crate::error::{FetchErrorKind, ScraperError};
use crate::retry::{with_retry, RetryPolicy};
use crate::strategy::{AcquisitionStrategy, LocationMenu};
use crate::window::{DayBatch, WindowMaintainer};

/// Lifecycle of one per-date scrape, logged at each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeState {
    Pending,
    PerLocationFetch,
    Aggregating,
    Done,
    Failed,
}

impl ScrapeState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScrapeState::Pending => "pending",
            ScrapeState::PerLocationFetch => "per_location_fetch",
            ScrapeState::Aggregating => "aggregating",
            ScrapeState::Done => "done",
            ScrapeState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ScrapeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location that still failed after its retry budget was spent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationFailure {
    pub location: String,
    pub class: &'static str,
    pub message: String,
    #[serde(skip)]
    pub kind: FetchErrorKind,
}

impl LocationFailure {
    fn new(location: String, err: &ScraperError) -> Self {
        Self {
            location,
            class: err.class_name(),
            message: err.to_string(),
            kind: err.kind().unwrap_or(FetchErrorKind::Network),
        }
    }
}

/// Everything one date produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeOutcome {
    pub date: NaiveDate,
    pub items: Vec<MenuItem>,
    /// Candidates only; dedup against the store happens on persist.
    pub unique_names: Vec<UniqueItemName>,
    /// Every successful location reported zero items.
    pub all_closed: bool,
    pub succeeded: usize,
    pub failures: Vec<LocationFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebuildSummary {
    pub center: NaiveDate,
    pub dates_with_data: Vec<NaiveDate>,
    pub dates_failed: Vec<NaiveDate>,
    pub entries_written: u64,
    pub new_names: u64,
    pub location_failures: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvanceSummary {
    /// The date appended at the far edge.
    pub date: NaiveDate,
    pub evicted: u64,
    pub shifted: u64,
    pub inserted: u64,
    pub new_names: u64,
    pub all_closed: bool,
    pub location_failures: Vec<LocationFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub items_written: u64,
    pub new_names: u64,
    pub all_closed: bool,
    pub location_failures: Vec<LocationFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoursSummary {
    pub date: NaiveDate,
    pub locations: u64,
}

pub struct Orchestrator {
    strategy: Arc<dyn AcquisitionStrategy>,
    store: Arc<dyn MenuStore>,
    locations: Vec<LocationConfig>,
    retry: RetryPolicy,
    date_retry: RetryPolicy,
    window: WindowMaintainer,
}

impl Orchestrator {
    /// `retry` bounds each per-location fetch. Ranged rebuilds additionally
    /// retry a whole date with the same policy unless
    /// [`Orchestrator::with_date_retry`] says otherwise.
    #[must_use]
    pub fn new(
        strategy: Arc<dyn AcquisitionStrategy>,
        store: Arc<dyn MenuStore>,
        locations: Vec<LocationConfig>,
        retry: RetryPolicy,
        window_days: u32,
    ) -> Self {
        Self {
            strategy,
            store,
            locations,
            retry,
            date_retry: retry,
            window: WindowMaintainer::new(window_days),
        }
    }

    #[must_use]
    pub fn with_date_retry(mut self, policy: RetryPolicy) -> Self {
        self.date_retry = policy;
        self
    }

    #[must_use]
    pub fn window(&self) -> WindowMaintainer {
        self.window
    }

    /// Fetches every location for `date`.
    ///
    /// Locations run up to the strategy's concurrency at a time, each through
    /// the retry controller. One location failing does not affect the others.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::NoDataForAnyLocation`] when no location
    /// succeeded.
    pub async fn scrape_day(&self, date: NaiveDate) -> Result<ScrapeOutcome, ScraperError> {
        let strategy = self.strategy.as_ref();
        let retry = self.retry;
        let concurrency = strategy.location_concurrency().max(1);

        tracing::debug!(%date, state = %ScrapeState::Pending, strategy = %strategy.kind(), locations = self.locations.len(), "scrape state");
        tracing::debug!(%date, state = %ScrapeState::PerLocationFetch, concurrency, "scrape state");

        let results: Vec<(String, Result<LocationMenu, ScraperError>)> = stream::iter(
            self.locations
                .iter()
                .map(|location| async move {
                    let operation = format!("fetch_day_menu {} {date}", location.name);
                    let result = with_retry(retry, &operation, move |_attempt| {
                        strategy.fetch_day_menu(location, date)
                    })
                    .await;
                    (location.name.clone(), result)
                })
                .collect::<Vec<_>>(),
        )
        .buffered(concurrency)
        .collect()
        .await;

        tracing::debug!(%date, state = %ScrapeState::Aggregating, "scrape state");
        let outcome = aggregate(date, results);

        if outcome.succeeded == 0 {
            tracing::error!(
                %date,
                state = %ScrapeState::Failed,
                failures = outcome.failures.len(),
                "no location produced data"
            );
            return Err(ScraperError::NoDataForAnyLocation {
                date,
                kinds: outcome.failures.iter().map(|f| f.kind).collect(),
            });
        }

        tracing::info!(
            %date,
            state = %ScrapeState::Done,
            items = outcome.items.len(),
            succeeded = outcome.succeeded,
            failed = outcome.failures.len(),
            all_closed = outcome.all_closed,
            "day scraped"
        );
        Ok(outcome)
    }

    /// Scrapes every date of the window centred on `today` and replaces the
    /// whole window in one store call.
    ///
    /// A date that still fails after its own retries is skipped and left as
    /// a hole. A date on which every location hit a challenge page is not
    /// retried as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::NoDataForAnyLocation`] (for `today`) when no
    /// date produced data, leaving the stored window untouched, or
    /// [`ScraperError::Store`] when a write fails.
    pub async fn rebuild_window(&self, today: NaiveDate) -> Result<RebuildSummary, ScraperError> {
        let mut batches = Vec::new();
        let mut candidates = Vec::new();
        let mut dates_with_data = Vec::new();
        let mut dates_failed = Vec::new();
        let mut location_failures = 0usize;

        for offset in self.window.offsets() {
            let date = today + ChronoDuration::days(i64::from(offset));
            let operation = format!("scrape_day {date}");
            match with_retry(self.date_retry, &operation, |_attempt| self.scrape_day(date)).await {
                Ok(outcome) => {
                    location_failures += outcome.failures.len();
                    dates_with_data.push(date);
                    candidates.extend(outcome.unique_names);
                    batches.push(DayBatch {
                        offset,
                        items: outcome.items,
                    });
                }
                Err(err) => {
                    tracing::warn!(%date, offset, class = err.class_name(), error = %err, "skipping date in rebuild");
                    dates_failed.push(date);
                }
            }
        }

        if dates_with_data.is_empty() {
            tracing::error!(center = %today, "rebuild produced no data, window left untouched");
            return Err(ScraperError::NoDataForAnyLocation {
                date: today,
                kinds: Vec::new(),
            });
        }

        let entries_written = self.window.rebuild(self.store.as_ref(), &batches).await?;
        let new_names = self.persist_new_names(&candidates).await?;

        tracing::info!(
            center = %today,
            entries_written,
            new_names,
            dates = dates_with_data.len(),
            failed_dates = dates_failed.len(),
            "window rebuild complete"
        );

        Ok(RebuildSummary {
            center: today,
            dates_with_data,
            dates_failed,
            entries_written,
            new_names,
            location_failures,
        })
    }

    /// Moves the window one day forward after the calendar rolled over to
    /// `today`, appending `today + N`.
    ///
    /// An all-closed far day still evicts and shifts.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::NoDataForAnyLocation`] when the far day could
    /// not be fetched at all; the window is not touched in that case.
    pub async fn advance_window(&self, today: NaiveDate) -> Result<AdvanceSummary, ScraperError> {
        let date = today + ChronoDuration::days(i64::from(self.window.half_width()));
        let outcome = self.scrape_day(date).await?;

        let AdvanceReport {
            evicted,
            shifted,
            inserted,
        } = self.window.advance(self.store.as_ref(), &outcome.items).await?;
        let new_names = self.persist_new_names(&outcome.unique_names).await?;

        Ok(AdvanceSummary {
            date,
            evicted,
            shifted,
            inserted,
            new_names,
            all_closed: outcome.all_closed,
            location_failures: outcome.failures,
        })
    }

    /// Replaces the day-scoped table with `date`'s items in one store write.
    ///
    /// When every location is closed the table is cleared and left empty.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::NoDataForAnyLocation`] without touching the
    /// table when nothing could be fetched, or [`ScraperError::Store`].
    pub async fn refresh_daily(&self, date: NaiveDate) -> Result<DailySummary, ScraperError> {
        let outcome = self.scrape_day(date).await?;

        if outcome.all_closed {
            tracing::info!(%date, "all dining closed, daily table left empty");
        }
        let items_written = self.store.replace_menu_items(date, &outcome.items).await?;
        let new_names = self.persist_new_names(&outcome.unique_names).await?;

        tracing::info!(%date, items_written, new_names, "daily table refreshed");
        Ok(DailySummary {
            date,
            items_written,
            new_names,
            all_closed: outcome.all_closed,
            location_failures: outcome.failures,
        })
    }

    /// Fetches the week containing `date` and replaces every stored
    /// location's operating times.
    ///
    /// # Errors
    ///
    /// Returns the last fetch error once retries are spent,
    /// [`ScraperError::NoDataForAnyLocation`] for an empty schedule, or
    /// [`ScraperError::Store`].
    pub async fn refresh_hours(&self, date: NaiveDate) -> Result<HoursSummary, ScraperError> {
        let strategy = self.strategy.as_ref();
        let operation = format!("fetch_week_hours {date}");
        let hours = with_retry(self.retry, &operation, move |_attempt| strategy.fetch_week_hours(date)).await?;

        if hours.is_empty() {
            tracing::error!(%date, "weekly schedule listed no locations");
            return Err(ScraperError::NoDataForAnyLocation {
                date,
                kinds: Vec::new(),
            });
        }

        let locations = self.store.replace_operating_hours(&hours).await?;
        tracing::info!(%date, locations, "operating hours replaced");
        Ok(HoursSummary { date, locations })
    }

    async fn persist_new_names(&self, candidates: &[UniqueItemName]) -> Result<u64, ScraperError> {
        if candidates.is_empty() {
            return Ok(0);
        }
        let known = self.store.known_unique_names().await?;
        let fresh = net_new_names(candidates, &known);
        if fresh.is_empty() {
            return Ok(0);
        }
        Ok(self.store.insert_unique_names(&fresh).await?)
    }
}

fn aggregate(date: NaiveDate, results: Vec<(String, Result<LocationMenu, ScraperError>)>) -> ScrapeOutcome {
    let mut outcome = ScrapeOutcome {
        date,
        items: Vec::new(),
        unique_names: Vec::new(),
        all_closed: false,
        succeeded: 0,
        failures: Vec::new(),
    };

    for (location, result) in results {
        match result {
            Ok(menu) => {
                outcome.succeeded += 1;
                if menu.closed {
                    tracing::debug!(location = %location, %date, "location closed");
                }
                outcome.items.extend(menu.items);
                outcome.unique_names.extend(menu.unique_names);
            }
            Err(err) => {
                tracing::warn!(
                    location = %location,
                    %date,
                    class = err.class_name(),
                    error = %err,
                    "location failed after retries"
                );
                outcome.failures.push(LocationFailure::new(location, &err));
            }
        }
    }

    outcome.all_closed = outcome.items.is_empty();
    outcome
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
