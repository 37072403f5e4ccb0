use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{AdvanceReport, MenuStore, StoreError};
use crate::{LocationOperatingTimes, MenuItem, UniqueItemName, WeeklyEntry};

#[derive(Debug, Default)]
struct Collections {
    unique_names: Vec<String>,
    menu_items: Vec<MenuItem>,
    weekly: Vec<WeeklyEntry>,
    hours: Vec<LocationOperatingTimes>,
}

/// In-process [`MenuStore`] used by tests and `--dry-run`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
    fail_writes: AtomicBool,
    fail_step: Mutex<Option<&'static str>>,
}

#[derive(Debug, thiserror::Error)]
#[error("writes disabled on this memory store")]
struct InjectedFailure;

// Steps inside the composite writes, named for failure injection.
const STEP_CLEAR_MENU_ITEMS: &str = "clear_menu_items";
const STEP_INSERT_MENU_ITEMS: &str = "insert_menu_items";
const STEP_EVICT: &str = "evict_weekly_entries";
const STEP_SHIFT: &str = "shift_weekly_offsets";
const STEP_INSERT_WEEKLY: &str = "insert_weekly_entries";

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with [`StoreError::Write`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes one named step of a composite write fail, after the steps
    /// before it have run. Steps: `clear_menu_items`, `insert_menu_items`,
    /// `evict_weekly_entries`, `shift_weekly_offsets`, `insert_weekly_entries`.
    pub fn set_fail_step(&self, step: Option<&'static str>) {
        *self
            .fail_step
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = step;
    }

    /// Places `items` at `offset` without going through the window logic.
    pub fn seed_weekly_entries(&self, items: &[MenuItem], offset: i32) {
        self.write().weekly.extend(items.iter().map(|item| WeeklyEntry {
            offset,
            item: item.clone(),
        }));
    }

    pub fn seed_menu_items(&self, items: &[MenuItem]) {
        self.write().menu_items.extend_from_slice(items);
    }

    pub fn seed_unique_names<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.write().unique_names.extend(names.into_iter().map(Into::into));
    }

    #[must_use]
    pub fn unique_names(&self) -> Vec<String> {
        self.read().unique_names.clone()
    }

    #[must_use]
    pub fn menu_items(&self) -> Vec<MenuItem> {
        self.read().menu_items.clone()
    }

    #[must_use]
    pub fn weekly_entries(&self) -> Vec<WeeklyEntry> {
        self.read().weekly.clone()
    }

    /// Distinct offsets that currently hold at least one entry, ascending.
    #[must_use]
    pub fn live_offsets(&self) -> Vec<i32> {
        self.read()
            .weekly
            .iter()
            .map(|e| e.offset)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[must_use]
    pub fn operating_hours(&self) -> Vec<LocationOperatingTimes> {
        self.read().hours.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn guard_write(&self, operation: &'static str) -> Result<RwLockWriteGuard<'_, Collections>, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::write(operation, InjectedFailure));
        }
        Ok(self.write())
    }

    fn check_step(&self, operation: &'static str, step: &'static str) -> Result<(), StoreError> {
        let failing = *self
            .fail_step
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if failing == Some(step) {
            return Err(StoreError::write(operation, InjectedFailure));
        }
        Ok(())
    }
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

#[async_trait]
impl MenuStore for MemoryStore {
    async fn known_unique_names(&self) -> Result<HashSet<String>, StoreError> {
        Ok(self.read().unique_names.iter().cloned().collect())
    }

    async fn insert_unique_names(&self, names: &[UniqueItemName]) -> Result<u64, StoreError> {
        let mut guard = self.guard_write("insert_unique_names")?;
        guard
            .unique_names
            .extend(names.iter().map(|n| n.name.clone()));
        Ok(count(names.len()))
    }

    async fn replace_menu_items(
        &self,
        _date: NaiveDate,
        items: &[MenuItem],
    ) -> Result<u64, StoreError> {
        const OP: &str = "replace_menu_items";
        let mut guard = self.guard_write(OP)?;
        let mut staged = guard.menu_items.clone();

        self.check_step(OP, STEP_CLEAR_MENU_ITEMS)?;
        staged.clear();
        self.check_step(OP, STEP_INSERT_MENU_ITEMS)?;
        staged.extend_from_slice(items);

        guard.menu_items = staged;
        Ok(count(items.len()))
    }

    async fn replace_weekly_window(&self, entries: &[WeeklyEntry]) -> Result<u64, StoreError> {
        let mut guard = self.guard_write("replace_weekly_window")?;
        guard.weekly = entries.to_vec();
        Ok(count(entries.len()))
    }

    async fn advance_weekly_window(
        &self,
        half_width: i32,
        new_day: &[MenuItem],
    ) -> Result<AdvanceReport, StoreError> {
        const OP: &str = "advance_weekly_window";
        let mut guard = self.guard_write(OP)?;
        let mut staged = guard.weekly.clone();

        self.check_step(OP, STEP_EVICT)?;
        let before = staged.len();
        staged.retain(|e| e.offset != -half_width);
        let evicted = before - staged.len();

        self.check_step(OP, STEP_SHIFT)?;
        for entry in &mut staged {
            entry.offset -= 1;
        }
        let shifted = staged.len();

        if !new_day.is_empty() {
            self.check_step(OP, STEP_INSERT_WEEKLY)?;
            staged.extend(new_day.iter().map(|item| WeeklyEntry {
                offset: half_width,
                item: item.clone(),
            }));
        }

        guard.weekly = staged;
        Ok(AdvanceReport {
            evicted: count(evicted),
            shifted: count(shifted),
            inserted: count(new_day.len()),
        })
    }

    async fn replace_operating_hours(
        &self,
        hours: &[LocationOperatingTimes],
    ) -> Result<u64, StoreError> {
        let mut guard = self.guard_write("replace_operating_hours")?;
        guard.hours = hours.to_vec();
        Ok(count(hours.len()))
    }
}
