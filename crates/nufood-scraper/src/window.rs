//! Maintenance of the rolling `-N..=+N` day window.
//!
//! The window is a set of `(offset, items)` pairs. A full rebuild swaps
//! every pair at once; a daily advance evicts the oldest edge, shifts the
//! rest down by one and appends the new far edge in a single store write.

use nufood_core::{AdvanceReport, MenuItem, MenuStore, StoreError, WeeklyEntry};

/// Items scraped for the day at `offset` from today.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBatch {
    pub offset: i32,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowMaintainer {
    half_width: i32,
}

impl WindowMaintainer {
    #[must_use]
    pub fn new(window_days: u32) -> Self {
        Self {
            half_width: i32::try_from(window_days).unwrap_or(i32::MAX),
        }
    }

    /// `N` in `-N..=+N`.
    #[must_use]
    pub fn half_width(&self) -> i32 {
        self.half_width
    }

    #[must_use]
    pub fn offsets(&self) -> std::ops::RangeInclusive<i32> {
        -self.half_width..=self.half_width
    }

    #[must_use]
    pub fn contains(&self, offset: i32) -> bool {
        self.offsets().contains(&offset)
    }

    /// Replaces the whole window with `days`.
    ///
    /// Batches with an offset outside the window are dropped. Empty batches
    /// simply leave a hole.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store rejects the swap.
    pub async fn rebuild(&self, store: &dyn MenuStore, days: &[DayBatch]) -> Result<u64, StoreError> {
        let mut entries = Vec::new();
        for day in days {
            if !self.contains(day.offset) {
                tracing::warn!(offset = day.offset, window = self.half_width, "dropping batch outside window");
                continue;
            }
            entries.extend(day.items.iter().map(|item| WeeklyEntry {
                offset: day.offset,
                item: item.clone(),
            }));
        }

        let written = store.replace_weekly_window(&entries).await?;
        tracing::info!(entries = written, window = self.half_width, "weekly window rebuilt");
        Ok(written)
    }

    /// Moves the window forward one calendar day.
    ///
    /// Eviction and shifting always happen. `new_day` lands at `+N` only
    /// when it has items.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store rejects the advance; the stored
    /// window is unchanged in that case.
    pub async fn advance(&self, store: &dyn MenuStore, new_day: &[MenuItem]) -> Result<AdvanceReport, StoreError> {
        if new_day.is_empty() {
            tracing::info!(offset = self.half_width, "new day has no items, leaving edge empty");
        }
        let report = store.advance_weekly_window(self.half_width, new_day).await?;

        tracing::info!(
            evicted = report.evicted,
            shifted = report.shifted,
            inserted = report.inserted,
            "weekly window advanced"
        );
        Ok(report)
    }
}
