//! Weekly-schedule payloads into [`LocationOperatingTimes`].

use chrono::NaiveDate;
use nufood_core::{DayHours, DayStatus, LocationOperatingTimes, TimeRange};

use crate::error::{FetchErrorKind, ScraperError};
use crate::types::{UpstreamDay, UpstreamHours, UpstreamLocationHours};

/// Converts every location in a weekly-schedule response.
///
/// # Errors
///
/// Returns a `malformed_payload` fetch error if a day carries an unparseable
/// date or an hour field outside `0..=255`.
pub fn convert_weekly_schedule(
    url: &str,
    locations: &[UpstreamLocationHours],
) -> Result<Vec<LocationOperatingTimes>, ScraperError> {
    locations
        .iter()
        .map(|location| {
            let week = location
                .week
                .iter()
                .map(|day| convert_day(url, &location.name, day))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(LocationOperatingTimes {
                name: location.name.clone(),
                week,
            })
        })
        .collect()
}

fn convert_day(url: &str, location: &str, day: &UpstreamDay) -> Result<DayHours, ScraperError> {
    let malformed = |reason: String| {
        ScraperError::fetch(
            FetchErrorKind::MalformedPayload,
            url,
            format!("{location}: {reason}"),
        )
    };

    let date = NaiveDate::parse_from_str(day.date.trim(), "%Y-%m-%d")
        .map_err(|e| malformed(format!("bad date {:?}: {e}", day.date)))?;
    let index = u8::try_from(day.day).map_err(|_| malformed(format!("bad day index {}", day.day)))?;
    let hours = day
        .hours
        .iter()
        .map(|h| convert_hours(h).ok_or_else(|| malformed(format!("bad hours {h:?}"))))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DayHours {
        day: index,
        date,
        status: DayStatus::from_upstream(&day.status, day.closed),
        hours,
    })
}

fn convert_hours(hours: &UpstreamHours) -> Option<TimeRange> {
    Some(TimeRange {
        start_hour: u8::try_from(hours.start_hour).ok()?,
        start_minutes: u8::try_from(hours.start_minutes).ok()?,
        end_hour: u8::try_from(hours.end_hour).ok()?,
        end_minutes: u8::try_from(hours.end_minutes).ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WeeklyScheduleResponse;
    use serde_json::json;

    fn schedule() -> WeeklyScheduleResponse {
        serde_json::from_value(json!({
            "status": "success",
            "request_time": 0.12,
            "records": 1,
            "the_locations": [{
                "id": "5b33ae291178e909d807593d",
                "active": true,
                "name": "Allison Dining Commons",
                "week": [
                    {
                        "day": 0, "date": "2024-12-15", "status": "open",
                        "hours": [
                            { "start_hour": 7, "start_minutes": 0, "end_hour": 10, "end_minutes": 0 },
                            { "start_hour": 17, "start_minutes": 0, "end_hour": 20, "end_minutes": 30 }
                        ],
                        "has_special_hours": false, "closed": false
                    },
                    {
                        "day": 1, "date": "2024-12-16", "status": "closed",
                        "hours": [], "has_special_hours": true, "closed": true
                    }
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn converts_days_and_ranges() {
        let resp = schedule();
        let out = convert_weekly_schedule("http://test", &resp.the_locations).unwrap();
        assert_eq!(out.len(), 1);
        let allison = &out[0];
        assert_eq!(allison.name, "Allison Dining Commons");
        assert_eq!(allison.week.len(), 2);
        assert_eq!(allison.week[0].status, DayStatus::Open);
        assert_eq!(allison.week[0].hours.len(), 2);
        assert_eq!(allison.week[0].hours[1].end_minutes, 30);
        assert_eq!(allison.week[1].status, DayStatus::Closed);
        assert_eq!(
            allison.week[1].date,
            NaiveDate::from_ymd_opt(2024, 12, 16).unwrap()
        );
    }

    #[test]
    fn closed_flag_overrides_status_text() {
        let mut resp = schedule();
        resp.the_locations[0].week[0].closed = true;
        let out = convert_weekly_schedule("http://test", &resp.the_locations).unwrap();
        assert_eq!(out[0].week[0].status, DayStatus::Closed);
    }

    #[test]
    fn bad_date_is_malformed() {
        let mut resp = schedule();
        resp.the_locations[0].week[0].date = "Dec 15".to_string();
        let err = convert_weekly_schedule("http://test", &resp.the_locations).unwrap_err();
        assert_eq!(err.kind(), Some(FetchErrorKind::MalformedPayload));
    }

    #[test]
    fn negative_hour_is_malformed() {
        let mut resp = schedule();
        resp.the_locations[0].week[0].hours[0].start_hour = -1;
        assert!(convert_weekly_schedule("http://test", &resp.the_locations).is_err());
    }
}
