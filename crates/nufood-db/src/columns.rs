//! Column-major views of item batches for `UNNEST` binding.

use chrono::NaiveDate;
use nufood_core::{LocationOperatingTimes, MenuItem};

#[derive(Debug, Default)]
pub(crate) struct ItemColumns {
    pub names: Vec<String>,
    pub descriptions: Vec<String>,
    pub served_on: Vec<NaiveDate>,
    pub locations: Vec<String>,
    pub stations: Vec<String>,
    pub meals: Vec<String>,
    pub portions: Vec<Option<String>>,
    pub calories: Vec<Option<f64>>,
    pub protein_g: Vec<Option<f64>>,
    pub carbs_g: Vec<Option<f64>>,
    pub fat_g: Vec<Option<f64>>,
}

impl ItemColumns {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            names: Vec::with_capacity(n),
            descriptions: Vec::with_capacity(n),
            served_on: Vec::with_capacity(n),
            locations: Vec::with_capacity(n),
            stations: Vec::with_capacity(n),
            meals: Vec::with_capacity(n),
            portions: Vec::with_capacity(n),
            calories: Vec::with_capacity(n),
            protein_g: Vec::with_capacity(n),
            carbs_g: Vec::with_capacity(n),
            fat_g: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, item: &MenuItem) {
        self.names.push(item.name.clone());
        self.descriptions.push(item.description.clone());
        self.served_on.push(item.date);
        self.locations.push(item.location.clone());
        self.stations.push(item.station.clone());
        self.meals.push(item.meal.clone());
        self.portions.push(item.portion.clone());
        self.calories.push(item.nutrition.calories);
        self.protein_g.push(item.nutrition.protein_g);
        self.carbs_g.push(item.nutrition.carbs_g);
        self.fat_g.push(item.nutrition.fat_g);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<'a> FromIterator<&'a MenuItem> for ItemColumns {
    fn from_iter<I: IntoIterator<Item = &'a MenuItem>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut columns = Self::with_capacity(iter.size_hint().0);
        for item in iter {
            columns.push(item);
        }
        columns
    }
}

#[derive(Debug, Default)]
pub(crate) struct HoursColumns {
    pub locations: Vec<String>,
    pub day_indexes: Vec<i16>,
    pub served_on: Vec<NaiveDate>,
    pub statuses: Vec<String>,
    pub hours: Vec<serde_json::Value>,
}

impl HoursColumns {
    /// One row per location and day.
    ///
    /// # Errors
    ///
    /// Returns the serialization error if an interval list cannot be encoded.
    pub fn from_weeks(weeks: &[LocationOperatingTimes]) -> Result<Self, serde_json::Error> {
        let mut columns = Self::default();
        for location in weeks {
            for day in &location.week {
                columns.locations.push(location.name.clone());
                columns.day_indexes.push(i16::from(day.day));
                columns.served_on.push(day.date);
                columns.statuses.push(day.status.to_string());
                columns.hours.push(serde_json::to_value(&day.hours)?);
            }
        }
        Ok(columns)
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
