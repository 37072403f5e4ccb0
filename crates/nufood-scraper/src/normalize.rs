//! Upstream categories and items into canonical [`MenuItem`]s.

use chrono::NaiveDate;
use nufood_core::{MenuItem, Nutrition, UniqueItemName};

use crate::filter::{is_ingredient, is_ingredient_category};
use crate::types::{UpstreamCategory, UpstreamItem, UpstreamNutrient};

/// Where and when a batch of categories was served.
#[derive(Debug, Clone, Copy)]
pub struct MenuContext<'a> {
    pub location: &'a str,
    pub meal: &'a str,
    pub date: NaiveDate,
}

/// Items that survived filtering, with one unique-name candidate per item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedMenu {
    pub items: Vec<MenuItem>,
    pub unique_names: Vec<UniqueItemName>,
}

impl NormalizedMenu {
    pub fn extend(&mut self, other: NormalizedMenu) {
        self.items.extend(other.items);
        self.unique_names.extend(other.unique_names);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Drops ingredient stations and ingredient items, converting everything
/// else.
///
/// The station name stored on each item is the upstream spelling, not the
/// lower-cased form used for filtering.
#[must_use]
pub fn normalize_categories(categories: &[UpstreamCategory], ctx: MenuContext<'_>) -> NormalizedMenu {
    let mut out = NormalizedMenu::default();

    for category in categories {
        if is_ingredient_category(&category.name) {
            tracing::debug!(
                location = ctx.location,
                meal = ctx.meal,
                station = %category.name,
                "skipping ingredient station"
            );
            continue;
        }

        for item in &category.items {
            if item.name.trim().is_empty() || is_ingredient(&item.name) {
                continue;
            }
            out.unique_names.push(UniqueItemName::new(item.name.clone()));
            out.items.push(to_menu_item(item, &category.name, ctx));
        }
    }

    out
}

fn to_menu_item(item: &UpstreamItem, station: &str, ctx: MenuContext<'_>) -> MenuItem {
    MenuItem {
        name: item.name.clone(),
        description: item.description.clone().unwrap_or_default(),
        date: ctx.date,
        location: ctx.location.to_string(),
        station: station.to_string(),
        meal: ctx.meal.to_string(),
        portion: item
            .portion
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        nutrition: extract_nutrition(&item.nutrients),
    }
}

/// Maps upstream nutrient rows onto the four tracked facts. Unknown rows
/// are ignored; values that are not numbers become `None`.
#[must_use]
pub fn extract_nutrition(nutrients: &[UpstreamNutrient]) -> Nutrition {
    let mut nutrition = Nutrition::default();

    for nutrient in nutrients {
        let name = nutrient.name.trim().to_ascii_lowercase();
        let value = nutrient.value.as_ref().and_then(parse_nutrient_value);

        if name.starts_with("calories") {
            nutrition.calories = value;
        } else if name.starts_with("protein") {
            nutrition.protein_g = value;
        } else if name.starts_with("total carbohydrate") || name.starts_with("carbohydrate") {
            nutrition.carbs_g = value;
        } else if name.starts_with("total fat") {
            nutrition.fat_g = value;
        }
    }

    nutrition
}

fn parse_nutrient_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let trimmed = s.trim().trim_end_matches(|c: char| c.is_ascii_alphabetic()).trim();
            trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
