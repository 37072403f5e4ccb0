use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    /// Production logs go to a collector, so they are written without
    /// terminal colour codes.
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which acquisition strategy a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Plain HTTP against the machine-readable endpoints.
    Direct,
    /// Headless browser against the machine-readable endpoints.
    BrowserApi,
    /// Headless browser against the human-facing menu pages.
    Render,
}

impl StrategyKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Direct => "direct",
            StrategyKind::BrowserApi => "browser_api",
            StrategyKind::Render => "render",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "direct" | "api" => Ok(StrategyKind::Direct),
            "browser_api" | "browser" => Ok(StrategyKind::BrowserApi),
            "render" | "heuristic" => Ok(StrategyKind::Render),
            other => Err(format!(
                "unknown strategy '{other}'; expected direct, browser_api, or render"
            )),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub env: Environment,
    pub log_level: String,
    pub locations_path: PathBuf,
    pub api_base_url: String,
    pub site_id: String,
    pub render_base_url: String,
    pub strategy: StrategyKind,
    pub window_days: u32,
    pub batch_max_attempts: u32,
    pub interactive_max_attempts: u32,
    pub retry_backoff_secs: u64,
    pub request_timeout_secs: u64,
    pub navigation_timeout_secs: u64,
    pub render_settle_ms: u64,
    pub render_concurrency: usize,
    pub user_agent: String,
    pub chrome_bin: Option<PathBuf>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("locations_path", &self.locations_path)
            .field("api_base_url", &self.api_base_url)
            .field("site_id", &self.site_id)
            .field("render_base_url", &self.render_base_url)
            .field("strategy", &self.strategy)
            .field("window_days", &self.window_days)
            .field("batch_max_attempts", &self.batch_max_attempts)
            .field("interactive_max_attempts", &self.interactive_max_attempts)
            .field("retry_backoff_secs", &self.retry_backoff_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("navigation_timeout_secs", &self.navigation_timeout_secs)
            .field("render_settle_ms", &self.render_settle_ms)
            .field("render_concurrency", &self.render_concurrency)
            .field("user_agent", &self.user_agent)
            .field("chrome_bin", &self.chrome_bin)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
