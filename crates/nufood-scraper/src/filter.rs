//! Stations and items that are build-your-own ingredients rather than dishes.
//!
//! Entries are stored lower-case and trimmed; lookups normalise the input the
//! same way, so casing and surrounding whitespace never matter.

/// Stations whose items are all ingredients. Grouped by the dining hall that
/// runs them.
pub const INGREDIENT_CATEGORIES: &[&str] = &[
    // Allison
    "pantry 1",
    "gluten free pantry",
    "beverage",
    "salad bar 1",
    "salad bar 2",
    "flame 1",
    "flame 2",
    // Sargent
    "planet eats (hot)",
    "planet eats (cold)",
    "planet eats toppings",
    "made to order deli",
    // Elder
    "deli",
    "salad bar",
    "my pantry",
];

pub const INGREDIENT_ITEMS: &[&str] = &[
    "shredded cheddar cheese",
    "crushed red pepper",
    "grated parmesan cheese",
    "lettuce leaf",
    "sliced red onion",
    "sliced dill pickles",
    "american cheese slice",
    "hamburger patty",
    "turkey burger (no bun)",
    "egg whites",
    "butter",
    "light cream cheese",
    "2% greek plain yogurt",
    "low fat strawberry yogurt",
    "low fat vanilla yogurt",
    "diced onions",
    "chopped spinach",
    "chopped broccoli",
    "chopped green bell pepper",
    "sliced mushrooms",
    "chopped tomatoes",
    "diced bacon",
    "turkey sausage link",
    "diced smoked ham",
    "oats 'n honey granola",
    "raisins",
    "sunflower spread",
    "grape jelly",
    "sliced green onions",
    "dried oregano",
    "chopped romaine lettuce",
    "spring mix",
    "chopped cilantro",
    "fresh orange & fennel",
    "charred tomato and green bean",
    "cucumber",
    "tomato",
    "parsley",
    "kale",
    "butternut squash",
    "mixed melon",
    "roasted sweet potatoes",
    "zucchini",
    "cherry tomatoes",
    "mushrooms",
    "spinach",
    "broccoli",
    "green beans",
    "carrots",
    "okra",
    "bell peppers",
    "onions",
    "garlic",
    "fresh herbs",
    "lemons",
    "eggs",
    "crumbled feta cheese",
    "yogurt",
    "sour cream",
    "chopped bacon",
    "meatless black bean burger",
    "long grain wild rice blend",
    "steamed rice",
    "wild rice",
    "avoiding gluten barilla penne",
    "granola",
    "soy sauce",
    "everything bagel seasoning",
    "sesame seed mix",
    "pomodoro sauce",
    "salsa verde",
    "salsa rojas",
    "guacamole",
    "pico de gallo",
    "olive oil",
    "sriracha aquafaba aioli",
    "white hamburger bun",
];

fn canonical(s: &str) -> String {
    s.trim().to_lowercase()
}

#[must_use]
pub fn is_ingredient_category(name: &str) -> bool {
    INGREDIENT_CATEGORIES.contains(&canonical(name).as_str())
}

#[must_use]
pub fn is_ingredient(name: &str) -> bool {
    INGREDIENT_ITEMS.contains(&canonical(name).as_str())
}
