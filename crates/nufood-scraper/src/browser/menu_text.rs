//! Positional reconstruction of menu items from rendered page text.
//!
//! A rendered menu flattens to runs of lines like
//!
//! ```text
//! Comfort                      <- station header
//! Buttermilk Pancakes          <- name
//! Fluffy pancakes with syrup   <- description (optional)
//! 2 each                       <- portion
//! 340                          <- calories
//! ```
//!
//! An item is recognised at its calorie line and read backwards from there.

use std::sync::LazyLock;

use nufood_core::{MenuItem, Nutrition, UniqueItemName};
use regex::Regex;

use crate::filter::{is_ingredient, is_ingredient_category};
use crate::normalize::{MenuContext, NormalizedMenu};

const STATION_KEYWORDS: &[&str] = &[
    "Comfort", "Rooted", "Fruit", "Cereals", "Bakery", "Beverage", "Grill", "Halal", "Kosher",
    "Flame", "Pantry",
];

const LABEL_KEYWORDS: &[&str] = &["Click any item", "Menu Item", "Portion", "Calories", "Favorite"];

const PORTION_UNITS: &[&str] = &[
    "cup", "oz", "slice", "each", "fl", "tbsp", "tsp", "ounce", "piece",
];

const MAX_CALORIES: i32 = 2500;

/// Descriptions this short are usually allergen badges or labels.
const MIN_DESCRIPTION_BYTES: usize = 16;

static STATION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = STATION_KEYWORDS.join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("valid station header regex")
});

fn is_label(line: &str) -> bool {
    LABEL_KEYWORDS.iter().any(|k| line.contains(k))
}

/// A station header names one of the known stations and is not a table label.
#[must_use]
pub fn is_station_header(line: &str) -> bool {
    STATION_HEADER.is_match(line) && !is_label(line)
}

fn has_portion_unit(portion: &str) -> bool {
    let lower = portion.to_lowercase();
    PORTION_UNITS.iter().any(|unit| lower.contains(unit))
}

fn parse_calories(line: &str) -> Option<i32> {
    line.trim().parse::<i32>().ok().filter(|c| *c < MAX_CALORIES)
}

/// Whether the line three above a calorie line can be an item name rather
/// than the tail of the previous item or a label.
fn can_be_name(line: &str) -> bool {
    !LABEL_KEYWORDS.contains(&line) && line.trim().parse::<i64>().is_err() && !is_station_header(line)
}

/// `"breakfast"` into `"Breakfast"`, `"late-night"` into `"Late-Night"`.
#[must_use]
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if ch.is_alphanumeric() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Rebuilds items from flattened page text.
///
/// Items under an ingredient station, items whose name is an ingredient or
/// a table label, and candidates whose portion has no serving unit are all
/// dropped.
#[must_use]
pub fn parse_menu_lines(lines: &[String], ctx: MenuContext<'_>) -> NormalizedMenu {
    let mut out = NormalizedMenu::default();
    let mut station: Option<&str> = None;

    for (i, line) in lines.iter().enumerate() {
        if is_station_header(line) {
            station = if is_ingredient_category(line) {
                None
            } else {
                Some(line.as_str())
            };
            continue;
        }

        let Some(calories) = parse_calories(line) else {
            continue;
        };
        let Some(current_station) = station else {
            continue;
        };
        if i < 2 {
            continue;
        }

        let portion = lines[i - 1].as_str();
        let before_portion = lines[i - 2].as_str();
        let (name, description) = if i >= 3 && can_be_name(&lines[i - 3]) {
            (lines[i - 3].as_str(), before_portion)
        } else {
            (before_portion, "")
        };

        if name.trim().is_empty() || is_label(name) || is_ingredient(name) || !has_portion_unit(portion) {
            continue;
        }

        let description = if description.len() < MIN_DESCRIPTION_BYTES || description == name {
            ""
        } else {
            description
        };

        out.unique_names.push(UniqueItemName::new(name));
        out.items.push(MenuItem {
            name: name.to_string(),
            description: description.to_string(),
            date: ctx.date,
            location: ctx.location.to_string(),
            station: current_station.to_string(),
            meal: ctx.meal.to_string(),
            portion: Some(portion.to_string()),
            nutrition: Nutrition {
                calories: Some(f64::from(calories)),
                ..Nutrition::default()
            },
        });
    }

    out
}
