//! Canonical menu records produced by the normalizer and handed to the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Nutrition facts for a single menu item.
///
/// Every field is optional: the upstream omits nutrients for many items and
/// the rendered-page fallback only ever recovers calories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
}

/// One occurrence of a dish: served at `location`/`station` during `meal` on `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub description: String,
    pub date: NaiveDate,
    pub location: String,
    pub station: String,
    /// Meal-of-day label as shown to users, e.g. `"Breakfast"`.
    pub meal: String,
    pub portion: Option<String>,
    #[serde(default)]
    pub nutrition: Nutrition,
}

/// A distinct dish name, independent of when or where it was served.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueItemName {
    pub name: String,
}

impl UniqueItemName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl From<&MenuItem> for UniqueItemName {
    fn from(item: &MenuItem) -> Self {
        Self::new(item.name.clone())
    }
}

/// A [`MenuItem`] placed in the rolling window at `offset` days from today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyEntry {
    pub offset: i32,
    pub item: MenuItem,
}
