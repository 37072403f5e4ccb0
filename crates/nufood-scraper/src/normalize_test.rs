use serde_json::json;

use super::*;

fn ctx(date: NaiveDate) -> MenuContext<'static> {
    MenuContext {
        location: "Sargent",
        meal: "Breakfast",
        date,
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 16).unwrap()
}

fn categories(value: serde_json::Value) -> Vec<UpstreamCategory> {
    serde_json::from_value(value).unwrap()
}

#[test]
fn sample_scenario_yields_exactly_pancakes() {
    let cats = categories(json!([
        { "name": "salad bar 1", "items": [ { "name": "Tomato" } ] },
        { "name": "Comfort", "items": [
            { "name": "Pancakes", "desc": "Delicious pancakes" },
            { "name": "Butter" }
        ] }
    ]));

    let menu = normalize_categories(&cats, ctx(day()));

    assert_eq!(menu.items.len(), 1);
    let item = &menu.items[0];
    assert_eq!(item.name, "Pancakes");
    assert_eq!(item.description, "Delicious pancakes");
    assert_eq!(item.location, "Sargent");
    assert_eq!(item.station, "Comfort");
    assert_eq!(item.meal, "Breakfast");
    assert_eq!(item.date, day());
    assert_eq!(menu.unique_names, vec![UniqueItemName::new("Pancakes")]);
}

#[test]
fn excluded_category_drops_every_item() {
    let cats = categories(json!([
        { "name": "Planet Eats (Cold)", "items": [
            { "name": "Turkey Breast" },
            { "name": "Thinly sliced ham" }
        ] }
    ]));
    assert!(normalize_categories(&cats, ctx(day())).is_empty());
}

#[test]
fn filtering_ignores_case_and_whitespace() {
    let cats = categories(json!([
        { "name": "  SALAD BAR 2 ", "items": [ { "name": "Croutons" } ] },
        { "name": "Grill", "items": [ { "name": "  BUTTER " }, { "name": "Burger" } ] }
    ]));
    let menu = normalize_categories(&cats, ctx(day()));
    let names: Vec<_> = menu.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Burger"]);
}

#[test]
fn normalization_is_idempotent_and_order_independent() {
    let forward = categories(json!([
        { "name": "Comfort", "items": [ { "name": "Pancakes" } ] },
        { "name": "Grill", "items": [ { "name": "Burger" } ] }
    ]));
    let mut reversed = forward.clone();
    reversed.reverse();

    let a = normalize_categories(&forward, ctx(day()));
    let b = normalize_categories(&forward, ctx(day()));
    assert_eq!(a, b);

    let mut a_names: Vec<_> = a.unique_names.iter().map(|n| n.name.clone()).collect();
    let mut r_names: Vec<_> = normalize_categories(&reversed, ctx(day()))
        .unique_names
        .iter()
        .map(|n| n.name.clone())
        .collect();
    a_names.sort();
    r_names.sort();
    assert_eq!(a_names, r_names);
}

#[test]
fn blank_item_names_are_skipped() {
    let cats = categories(json!([
        { "name": "Comfort", "items": [ { "name": "   " }, { "name": "Oatmeal" } ] }
    ]));
    assert_eq!(normalize_categories(&cats, ctx(day())).items.len(), 1);
}

#[test]
fn portion_and_nutrition_are_carried_over() {
    let cats = categories(json!([
        { "name": "Comfort", "items": [ {
            "name": "Scrambled Eggs",
            "portion": " 1/2 cup ",
            "nutrients": [
                { "name": "Calories", "value": "140" },
                { "name": "Protein (g)", "value": "12g" },
                { "name": "Total Carbohydrates (g)", "value": 2 },
                { "name": "Total Fat (g)", "value": "-" },
                { "name": "Sodium (mg)", "value": "300" }
            ]
        } ] }
    ]));
    let menu = normalize_categories(&cats, ctx(day()));
    let item = &menu.items[0];
    assert_eq!(item.portion.as_deref(), Some("1/2 cup"));
    assert_eq!(item.nutrition.calories, Some(140.0));
    assert_eq!(item.nutrition.protein_g, Some(12.0));
    assert_eq!(item.nutrition.carbs_g, Some(2.0));
    assert_eq!(item.nutrition.fat_g, None);
}

#[test]
fn missing_nutrients_leave_nutrition_empty() {
    assert!(extract_nutrition(&[]).is_empty());
}
