//! Weekly operating-hours snapshot types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Open,
    Closed,
}

impl DayStatus {
    /// Interprets an upstream status string. Anything other than an explicit
    /// closed marker is treated as open.
    #[must_use]
    pub fn from_upstream(status: &str, closed_flag: bool) -> Self {
        if closed_flag || status.trim().eq_ignore_ascii_case("closed") {
            DayStatus::Closed
        } else {
            DayStatus::Open
        }
    }
}

impl std::fmt::Display for DayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayStatus::Open => write!(f, "open"),
            DayStatus::Closed => write!(f, "closed"),
        }
    }
}

/// A single open interval in 24-hour wall-clock time.
///
/// Hours are kept as raw integers rather than `NaiveTime` because the
/// upstream reports late closings as `24:00` and later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_hour: u8,
    pub start_minutes: u8,
    pub end_hour: u8,
    pub end_minutes: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    /// 0 = first day of the displayed week (Sunday).
    pub day: u8,
    pub date: NaiveDate,
    pub status: DayStatus,
    pub hours: Vec<TimeRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationOperatingTimes {
    pub name: String,
    pub week: Vec<DayHours>,
}
