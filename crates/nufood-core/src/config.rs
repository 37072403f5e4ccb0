use crate::app_config::{AppConfig, Environment, StrategyKind};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it from a plain
/// `HashMap` without `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = lookup("DATABASE_URL").ok().filter(|s| !s.is_empty());
    let env = parse_environment(&or_default("NUFOOD_ENV", "development"))?;
    let log_level = or_default("NUFOOD_LOG_LEVEL", "info");
    let locations_path = PathBuf::from(or_default(
        "NUFOOD_LOCATIONS_PATH",
        "./config/locations.yaml",
    ));

    let api_base_url = or_default("NUFOOD_API_BASE_URL", "https://api.dineoncampus.com/v1")
        .trim_end_matches('/')
        .to_string();
    let site_id = or_default("NUFOOD_SITE_ID", "5acea5d8f3eeb60b08c5a50d");
    let render_base_url = or_default(
        "NUFOOD_RENDER_BASE_URL",
        "https://dineoncampus.com/northwestern",
    )
    .trim_end_matches('/')
    .to_string();

    let strategy = or_default("NUFOOD_STRATEGY", "browser_api")
        .parse::<StrategyKind>()
        .map_err(|reason| invalid("NUFOOD_STRATEGY", reason))?;

    let window_days = parse_u32("NUFOOD_WINDOW_DAYS", "3")?;
    let batch_max_attempts = parse_u32("NUFOOD_BATCH_MAX_ATTEMPTS", "10")?;
    let interactive_max_attempts = parse_u32("NUFOOD_INTERACTIVE_MAX_ATTEMPTS", "3")?;
    if batch_max_attempts == 0 {
        return Err(invalid("NUFOOD_BATCH_MAX_ATTEMPTS", "must be at least 1".into()));
    }
    if interactive_max_attempts == 0 {
        return Err(invalid(
            "NUFOOD_INTERACTIVE_MAX_ATTEMPTS",
            "must be at least 1".into(),
        ));
    }
    let retry_backoff_secs = parse_u64("NUFOOD_RETRY_BACKOFF_SECS", "1")?;

    let request_timeout_secs = parse_u64("NUFOOD_REQUEST_TIMEOUT_SECS", "30")?;
    let navigation_timeout_secs = parse_u64("NUFOOD_NAVIGATION_TIMEOUT_SECS", "25")?;
    let render_settle_ms = parse_u64("NUFOOD_RENDER_SETTLE_MS", "8000")?;
    let render_concurrency = parse_usize("NUFOOD_RENDER_CONCURRENCY", "5")?;
    if render_concurrency == 0 {
        return Err(invalid(
            "NUFOOD_RENDER_CONCURRENCY",
            "must be at least 1".into(),
        ));
    }
    let user_agent = or_default("NUFOOD_USER_AGENT", DEFAULT_USER_AGENT);
    let chrome_bin = lookup("CHROME_BIN")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);

    let db_max_connections = parse_u32("NUFOOD_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("NUFOOD_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("NUFOOD_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        locations_path,
        api_base_url,
        site_id,
        render_base_url,
        strategy,
        window_days,
        batch_max_attempts,
        interactive_max_attempts,
        retry_backoff_secs,
        request_timeout_secs,
        navigation_timeout_secs,
        render_settle_ms,
        render_concurrency,
        user_agent,
        chrome_bin,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "NUFOOD_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
