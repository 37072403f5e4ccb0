//! The acquisition capability shared by every scraping strategy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use nufood_core::{AppConfig, LocationConfig, LocationOperatingTimes, MenuItem, StrategyKind, UniqueItemName};

use crate::browser::{BrowserApiStrategy, ChromeFetcher, RenderSettings, RenderStrategy};
use crate::direct::DirectApiStrategy;
use crate::error::ScraperError;
use crate::normalize::NormalizedMenu;

/// One location's menu for one date, already filtered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationMenu {
    pub location: String,
    pub items: Vec<MenuItem>,
    pub unique_names: Vec<UniqueItemName>,
    /// True when every meal service yielded zero items.
    pub closed: bool,
}

impl LocationMenu {
    #[must_use]
    pub fn from_normalized(location: &str, menu: NormalizedMenu) -> Self {
        let closed = menu.items.is_empty();
        Self {
            location: location.to_string(),
            items: menu.items,
            unique_names: menu.unique_names,
            closed,
        }
    }

    #[must_use]
    pub fn closed(location: &str) -> Self {
        Self {
            location: location.to_string(),
            closed: true,
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait AcquisitionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Fetches and normalizes every meal service of `location` on `date`.
    ///
    /// Succeeds as long as at least one service was fetched; a location
    /// whose services all errored returns the last error.
    async fn fetch_day_menu(
        &self,
        location: &LocationConfig,
        date: NaiveDate,
    ) -> Result<LocationMenu, ScraperError>;

    /// Fetches the operating hours of the week containing `date`.
    async fn fetch_week_hours(&self, date: NaiveDate) -> Result<Vec<LocationOperatingTimes>, ScraperError>;

    /// How many locations the orchestrator may fetch at once.
    fn location_concurrency(&self) -> usize {
        1
    }
}

/// Builds the strategy selected by `kind`.
///
/// Browser-backed strategies launch the browser here, so a missing
/// executable surfaces as a `launch_failure` before any location is tried.
///
/// # Errors
///
/// Returns [`ScraperError`] if the HTTP client or the browser cannot be
/// started.
pub async fn build_strategy(
    kind: StrategyKind,
    config: &AppConfig,
    locations: &[LocationConfig],
) -> Result<Arc<dyn AcquisitionStrategy>, ScraperError> {
    let strategy: Arc<dyn AcquisitionStrategy> = match kind {
        StrategyKind::Direct => Arc::new(DirectApiStrategy::new(
            &config.api_base_url,
            &config.site_id,
            config.request_timeout_secs,
            &config.user_agent,
        )?),
        StrategyKind::BrowserApi => {
            let fetcher = ChromeFetcher::launch(config.chrome_bin.as_deref(), &config.user_agent).await?;
            Arc::new(BrowserApiStrategy::new(
                Arc::new(fetcher),
                &config.api_base_url,
                &config.site_id,
                Duration::from_secs(config.navigation_timeout_secs),
            ))
        }
        StrategyKind::Render => {
            let fetcher = ChromeFetcher::launch(config.chrome_bin.as_deref(), &config.user_agent).await?;
            Arc::new(RenderStrategy::new(
                Arc::new(fetcher),
                RenderSettings {
                    base_url: config.render_base_url.clone(),
                    settle: Duration::from_millis(config.render_settle_ms),
                    navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
                    concurrency: config.render_concurrency,
                },
                locations.to_vec(),
            ))
        }
    };

    tracing::info!(strategy = %kind, "acquisition strategy ready");
    Ok(strategy)
}

/// Merges per-service outcomes into a location result.
///
/// Failed services are logged and dropped. If nothing succeeded the last
/// error is returned wrapped in [`ScraperError::AllServicesFailed`].
pub(crate) fn merge_service_results(
    location: &str,
    results: Vec<(String, Result<NormalizedMenu, ScraperError>)>,
) -> Result<LocationMenu, ScraperError> {
    if results.is_empty() {
        return Ok(LocationMenu::closed(location));
    }

    let mut merged = NormalizedMenu::default();
    let mut succeeded = 0usize;
    let mut last_error = None;

    for (meal, result) in results {
        match result {
            Ok(menu) => {
                succeeded += 1;
                tracing::debug!(location, meal = %meal, items = menu.items.len(), "meal service fetched");
                merged.extend(menu);
            }
            Err(err) => {
                tracing::warn!(location, meal = %meal, class = err.class_name(), error = %err, "meal service failed");
                last_error = Some(err);
            }
        }
    }

    match (succeeded, last_error) {
        (0, Some(err)) => Err(ScraperError::AllServicesFailed {
            location: location.to_string(),
            last_error: Box::new(err),
        }),
        _ => Ok(LocationMenu::from_normalized(location, merged)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;

    fn menu_with(name: &str) -> NormalizedMenu {
        let item = MenuItem {
            name: name.to_string(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 12, 16).unwrap(),
            location: "Elder".into(),
            station: "Comfort".into(),
            meal: "Lunch".into(),
            portion: None,
            nutrition: nufood_core::Nutrition::default(),
        };
        NormalizedMenu {
            unique_names: vec![UniqueItemName::new(name)],
            items: vec![item],
        }
    }

    fn failure() -> ScraperError {
        ScraperError::fetch(FetchErrorKind::NavigationTimeout, "http://x", "deadline")
    }

    #[test]
    fn partial_service_failure_keeps_successes() {
        let out = merge_service_results(
            "Elder",
            vec![
                ("Breakfast".into(), Err(failure())),
                ("Lunch".into(), Ok(menu_with("Soup"))),
            ],
        )
        .unwrap();
        assert_eq!(out.items.len(), 1);
        assert!(!out.closed);
    }

    #[test]
    fn all_services_failing_is_an_error() {
        let err = merge_service_results(
            "Elder",
            vec![("Breakfast".into(), Err(failure())), ("Lunch".into(), Err(failure()))],
        )
        .unwrap_err();
        assert!(matches!(err, ScraperError::AllServicesFailed { .. }));
        assert_eq!(err.kind(), Some(FetchErrorKind::NavigationTimeout));
    }

    #[test]
    fn empty_successes_mean_closed() {
        let out = merge_service_results("Elder", vec![("Lunch".into(), Ok(NormalizedMenu::default()))]).unwrap();
        assert!(out.closed);
    }

    #[test]
    fn no_services_means_closed() {
        assert!(merge_service_results("Elder", vec![]).unwrap().closed);
    }
}
