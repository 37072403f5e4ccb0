//! Weekly hours recovered from the rendered hours-of-operation page.
//!
//! The page prints each location's name twice, then one entry per day. A
//! single range is printed twice; a split day prints its first range once
//! followed by the second range twice:
//!
//! ```text
//! Allison Dining Commons
//! Allison Dining Commons
//! 7:00a - 8:00p
//! 7:00a - 8:00p
//! 7:00a - 10:00a
//! 5:00p - 8:00p
//! 5:00p - 8:00p
//! Closed
//! Closed
//! ...
//! ```

use std::sync::LazyLock;

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use nufood_core::{DayHours, DayStatus, LocationOperatingTimes, TimeRange};
use regex::Regex;

const DAYS_PER_WEEK: u8 = 7;

/// Lines containing any of these start another location's block.
const SECTION_BOUNDARIES: &[&str] = &["Dining", "Norris", "Coffee", "Retail"];

static CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,2})(?::(\d{2}))?\s*([ap])\.?(?:m\.?)?$").expect("valid clock regex")
});

/// Sunday on or before `date`.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - ChronoDuration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Parses `"November 2, 2025"`.
#[must_use]
pub fn parse_week_of_date(s: &str) -> Option<NaiveDate> {
    let cleaned = s.trim().trim_end_matches(['.', ')', ':']).trim();
    NaiveDate::parse_from_str(cleaned, "%B %d, %Y").ok()
}

/// Parses `"7:00a"`, `"7:00 PM"` or `"12p"` into 24-hour `(hour, minutes)`.
#[must_use]
pub fn parse_clock(s: &str) -> Option<(u8, u8)> {
    let caps = CLOCK.captures(s.trim())?;
    let hour: u8 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: u8 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
    if hour == 0 || hour > 12 || minutes > 59 {
        return None;
    }
    let pm = caps.get(3)?.as_str().eq_ignore_ascii_case("p");
    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    Some((hour, minutes))
}

/// Parses `"7:00a - 8:00p"`.
#[must_use]
pub fn parse_time_range(line: &str) -> Option<TimeRange> {
    let (start, end) = line.split_once(" - ").or_else(|| line.split_once(" – "))?;
    let (start_hour, start_minutes) = parse_clock(start)?;
    let (end_hour, end_minutes) = parse_clock(end)?;
    Some(TimeRange {
        start_hour,
        start_minutes,
        end_hour,
        end_minutes,
    })
}

fn looks_like_range(line: &str) -> bool {
    (line.contains(" - ") || line.contains(" – ")) && (line.contains('a') || line.contains('p'))
}

fn is_closed_marker(line: &str) -> bool {
    line.eq_ignore_ascii_case("closed")
}

fn is_section_boundary(line: &str) -> bool {
    SECTION_BOUNDARIES.iter().any(|k| line.contains(k))
}

/// Finds the displayed week from a `"... week of <Month> <Day>, <Year>"` line.
#[must_use]
pub fn find_week_start(lines: &[String]) -> Option<NaiveDate> {
    lines.iter().find_map(|line| {
        let (_, rest) = line.split_once("week of")?;
        parse_week_of_date(rest)
    })
}

/// Extracts the week for every name in `location_names` that appears on the
/// page. Names that are missing are skipped with a warning.
///
/// Days are dated from the page's "week of" label, or from `fallback_week`
/// when the label is absent. Days the page does not list are closed.
#[must_use]
pub fn parse_hours_lines(
    lines: &[String],
    location_names: &[String],
    fallback_week: NaiveDate,
) -> Vec<LocationOperatingTimes> {
    let week_start = find_week_start(lines).unwrap_or_else(|| {
        tracing::warn!(%fallback_week, "no week label on hours page, using fallback week");
        fallback_week
    });

    location_names
        .iter()
        .filter_map(|name| {
            let parsed = parse_location_block(lines, name, week_start);
            if parsed.is_none() {
                tracing::warn!(location = %name, "location not found on hours page");
            }
            parsed
        })
        .collect()
}

fn parse_location_block(lines: &[String], name: &str, week_start: NaiveDate) -> Option<LocationOperatingTimes> {
    let header = lines
        .windows(2)
        .position(|pair| pair[0].contains(name) && pair[1].contains(name))?;
    let full_name = lines[header].trim().to_string();

    let mut week: Vec<DayHours> = (0..DAYS_PER_WEEK)
        .map(|day| DayHours {
            day,
            date: week_start + ChronoDuration::days(i64::from(day)),
            status: DayStatus::Closed,
            hours: Vec::new(),
        })
        .collect();

    let mut day = 0usize;
    let mut i = header + 2;

    while day < week.len() && i < lines.len() {
        let line = lines[i].trim();

        if is_section_boundary(line) {
            break;
        }

        if is_closed_marker(line) {
            i += 1;
            if i < lines.len() && lines[i].trim() == line {
                i += 1;
            }
            day += 1;
            continue;
        }

        if !looks_like_range(line) {
            i += 1;
            continue;
        }

        let entry = &mut week[day];
        entry.hours.extend(parse_time_range(line));
        i += 1;

        if i < lines.len() {
            let next = lines[i].trim();
            if next == line {
                i += 1;
            } else if looks_like_range(next) {
                entry.hours.extend(parse_time_range(next));
                i += 1;
                if i < lines.len() && lines[i].trim() == next {
                    i += 1;
                }
            }
        }

        entry.status = if entry.hours.is_empty() {
            DayStatus::Closed
        } else {
            DayStatus::Open
        };
        day += 1;
    }

    Some(LocationOperatingTimes {
        name: full_name,
        week,
    })
}
