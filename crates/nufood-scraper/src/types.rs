//! Upstream JSON payloads. Only the fields the pipeline reads are modelled;
//! everything else is ignored by serde.

use serde::{Deserialize, Serialize};

/// A single nutrient row, e.g. `{"name": "Protein (g)", "value": "12"}`.
///
/// `value` arrives as a string most of the time but occasionally as a bare
/// number, so it is kept loosely typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamNutrient {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamItem {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "desc")]
    pub description: Option<String>,
    #[serde(default)]
    pub portion: Option<String>,
    #[serde(default)]
    pub nutrients: Vec<UpstreamNutrient>,
}

/// A station on the menu, e.g. `Comfort` or `Salad Bar 1`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamCategory {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<UpstreamItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamPeriodMenu {
    #[serde(default)]
    pub categories: Vec<UpstreamCategory>,
}

/// `GET /location/{id}/periods/{service_id}?platform=0&date=...`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceMenuResponse {
    #[serde(default)]
    pub menu: ServiceMenu,
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceMenu {
    #[serde(default)]
    pub periods: UpstreamPeriodMenu,
}

/// One meal period a location publishes for a date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamPeriod {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// `GET /locations/{id}/periods/?date=...`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodsResponse {
    #[serde(default)]
    pub periods: Vec<UpstreamPeriod>,
}

/// `GET /locations/{id}/menu?date=...&period=...`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodMenuResponse {
    #[serde(default)]
    pub period: UpstreamPeriodMenu,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UpstreamHours {
    pub start_hour: i64,
    pub start_minutes: i64,
    pub end_hour: i64,
    pub end_minutes: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamDay {
    pub day: i64,
    pub date: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub hours: Vec<UpstreamHours>,
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamLocationHours {
    pub name: String,
    #[serde(default)]
    pub week: Vec<UpstreamDay>,
}

/// `GET /locations/weekly_schedule?site_id=...&date=...`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyScheduleResponse {
    #[serde(default)]
    pub the_locations: Vec<UpstreamLocationHours>,
}
