//! Offline tests for nufood-db pool configuration.
//! These tests do not require a live database connection.

use std::path::PathBuf;

use nufood_core::{AppConfig, Environment, StrategyKind};
use nufood_db::{connect_pool_from_config, DbError, PoolConfig};

fn app_config(database_url: Option<&str>) -> AppConfig {
    AppConfig {
        database_url: database_url.map(str::to_string),
        env: Environment::Test,
        log_level: "info".to_string(),
        locations_path: PathBuf::from("./config/locations.yaml"),
        api_base_url: "https://api.example.test/v1".to_string(),
        site_id: "site".to_string(),
        render_base_url: "https://dining.example.test/campus".to_string(),
        strategy: StrategyKind::Direct,
        window_days: 3,
        batch_max_attempts: 10,
        interactive_max_attempts: 3,
        retry_backoff_secs: 1,
        request_timeout_secs: 30,
        navigation_timeout_secs: 25,
        render_settle_ms: 8000,
        render_concurrency: 5,
        user_agent: "ua".to_string(),
        chrome_bin: None,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config(Some("postgres://example")));
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[tokio::test]
async fn missing_database_url_is_reported_before_connecting() {
    let err = connect_pool_from_config(&app_config(None)).await.unwrap_err();
    assert!(
        matches!(err, DbError::MissingDatabaseUrl),
        "expected MissingDatabaseUrl, got: {err:?}"
    );
}
