//! Persistence contract for ingested menus and hours.
//!
//! The pipeline never talks to a concrete database. The orchestrator and the
//! window maintainer receive a `MenuStore` by injection; `nufood-db` provides
//! the Postgres implementation and [`MemoryStore`] backs tests and dry runs.

mod memory;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::{LocationOperatingTimes, MenuItem, UniqueItemName, WeeklyEntry};

pub use memory::MemoryStore;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store write failed during {operation}: {source}")]
    Write {
        operation: &'static str,
        #[source]
        source: BoxedSource,
    },

    #[error("store read failed during {operation}: {source}")]
    Read {
        operation: &'static str,
        #[source]
        source: BoxedSource,
    },
}

impl StoreError {
    pub fn write(operation: &'static str, source: impl Into<BoxedSource>) -> Self {
        Self::Write {
            operation,
            source: source.into(),
        }
    }

    pub fn read(operation: &'static str, source: impl Into<BoxedSource>) -> Self {
        Self::Read {
            operation,
            source: source.into(),
        }
    }

    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Write { operation, .. } | Self::Read { operation, .. } => operation,
        }
    }
}

/// Row counts from one window advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdvanceReport {
    pub evicted: u64,
    pub shifted: u64,
    pub inserted: u64,
}

/// Durable keyed storage for the three canonical collections plus the
/// day-scoped daily table.
///
/// Every method that rewrites more than one row set is all-or-nothing: a
/// failure leaves the collection as it was before the call. Errors are
/// surfaced to the caller and never retried by the pipeline.
#[async_trait]
pub trait MenuStore: Send + Sync {
    /// Every dish name ever recorded.
    async fn known_unique_names(&self) -> Result<HashSet<String>, StoreError>;

    async fn insert_unique_names(&self, names: &[UniqueItemName]) -> Result<u64, StoreError>;

    /// Swaps the daily table's contents for `items`. An empty slice leaves
    /// the table empty.
    async fn replace_menu_items(
        &self,
        date: NaiveDate,
        items: &[MenuItem],
    ) -> Result<u64, StoreError>;

    /// Swaps the whole rolling window for `entries`.
    async fn replace_weekly_window(&self, entries: &[WeeklyEntry]) -> Result<u64, StoreError>;

    /// Slides the window one day: drops offset `-half_width`, moves every
    /// remaining entry down by one and appends `new_day` at `+half_width`.
    async fn advance_weekly_window(
        &self,
        half_width: i32,
        new_day: &[MenuItem],
    ) -> Result<AdvanceReport, StoreError>;

    async fn replace_operating_hours(
        &self,
        hours: &[LocationOperatingTimes],
    ) -> Result<u64, StoreError>;
}
