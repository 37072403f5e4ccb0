pub mod app_config;
pub mod config;
pub mod hours;
pub mod locations;
pub mod menu;
pub mod store;

pub use app_config::{AppConfig, Environment, StrategyKind};
pub use config::{load_app_config, load_app_config_from_env};
pub use hours::{DayHours, DayStatus, LocationOperatingTimes, TimeRange};
pub use locations::{
    load_locations, parse_locations, LocationConfig, LocationsFile, MealServiceConfig,
};
pub use menu::{MenuItem, Nutrition, UniqueItemName, WeeklyEntry};
pub use store::{AdvanceReport, MemoryStore, MenuStore, StoreError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read locations file {path}: {source}")]
    LocationsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse locations file: {0}")]
    LocationsFileParse(#[from] serde_yaml::Error),

    #[error("locations validation failed: {0}")]
    Validation(String),
}
