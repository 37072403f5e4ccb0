use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A meal service the upstream publishes for a location, e.g. `Lunch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealServiceConfig {
    /// Display label stored on every [`crate::MenuItem`] (`"Breakfast"`).
    pub meal: String,
    /// Upstream service/period id used by the direct periods endpoint.
    pub id: String,
}

impl MealServiceConfig {
    /// URL slug of the meal on rendered menu pages (`"breakfast"`).
    #[must_use]
    pub fn slug(&self) -> String {
        self.meal.trim().to_lowercase().replace(' ', "-")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub name: String,
    /// Upstream location id for the machine-readable endpoints.
    pub id: String,
    /// Path segment of the human-facing menu page.
    pub slug: String,
    #[serde(default)]
    pub services: Vec<MealServiceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationsFile {
    pub locations: Vec<LocationConfig>,
}

/// Load and validate the dining location table from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_locations(path: &Path) -> Result<LocationsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LocationsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_locations(&content)
}

/// Parse and validate a location table from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text does not parse or fails validation.
pub fn parse_locations(content: &str) -> Result<LocationsFile, ConfigError> {
    let file: LocationsFile = serde_yaml::from_str(content)?;
    validate_locations(&file)?;
    Ok(file)
}

fn validate_locations(file: &LocationsFile) -> Result<(), ConfigError> {
    if file.locations.is_empty() {
        return Err(ConfigError::Validation(
            "at least one location must be configured".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();
    let mut seen_ids = HashSet::new();

    for location in &file.locations {
        if location.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "location name must be non-empty".to_string(),
            ));
        }

        if location.slug.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "location '{}' has an empty slug",
                location.name
            )));
        }

        if !seen_names.insert(location.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate location name: '{}'",
                location.name
            )));
        }

        if !seen_ids.insert(location.id.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate location id: '{}' (from location '{}')",
                location.id, location.name
            )));
        }

        let mut seen_meals = HashSet::new();
        for service in &location.services {
            if !seen_meals.insert(service.meal.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "location '{}' lists meal '{}' twice",
                    location.name, service.meal
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
locations:
  - name: Allison
    id: 5b33ae291178e909d807593d
    slug: allison-dining-commons
    services:
      - meal: Breakfast
        id: 66e1fc2de45d43074be3a0e5
      - meal: Lunch
        id: 66e1fc2de45d43074be3a0fb
  - name: Plex East
    id: 5bae7ee9f3eeb60cb4f8f3af
    slug: foster-walker-plex-east
";

    #[test]
    fn parses_sample_table() {
        let file = parse_locations(SAMPLE).unwrap();
        assert_eq!(file.locations.len(), 2);
        assert_eq!(file.locations[0].services.len(), 2);
        assert!(file.locations[1].services.is_empty());
    }

    #[test]
    fn meal_slug_is_lowercase() {
        let service = MealServiceConfig {
            meal: "Late Night".to_string(),
            id: "x".to_string(),
        };
        assert_eq!(service.slug(), "late-night");
    }

    #[test]
    fn rejects_duplicate_names_case_insensitively() {
        let yaml = r"
locations:
  - { name: Elder, id: a, slug: elder }
  - { name: elder, id: b, slug: elder-2 }
";
        let err = parse_locations(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate location name")));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let yaml = r"
locations:
  - { name: Elder, id: a, slug: elder }
  - { name: Sargent, id: a, slug: sargent }
";
        let err = parse_locations(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate location id")));
    }

    #[test]
    fn rejects_empty_slug() {
        let yaml = r#"
locations:
  - { name: Elder, id: a, slug: "" }
"#;
        assert!(matches!(
            parse_locations(yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_empty_table() {
        assert!(matches!(
            parse_locations("locations: []"),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_repeated_meal() {
        let yaml = r"
locations:
  - name: Elder
    id: a
    slug: elder
    services:
      - { meal: Lunch, id: one }
      - { meal: lunch, id: two }
";
        assert!(matches!(
            parse_locations(yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn shipped_location_table_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/locations.yaml");
        let file = load_locations(&path).unwrap();
        let names: Vec<&str> = file.locations.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Allison", "Sargent", "Plex West", "Plex East", "Elder"]);
        assert!(file.locations.iter().all(|l| !l.services.is_empty()));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_locations(Path::new("/nonexistent/locations.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::LocationsFileIo { .. }));
    }
}
