use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use nufood_core::{LocationConfig, LocationOperatingTimes, StrategyKind};
use tokio::sync::Semaphore;

use super::hours_text::{parse_hours_lines, week_start};
use super::menu_text::{parse_menu_lines, title_case};
use super::page::{is_anti_bot_page, truncate_chars, visible_lines};
use super::{PageFetcher, PageRequest, FORWARD_CLICK_PAUSE};
use crate::error::{FetchErrorKind, ScraperError};
use crate::normalize::{MenuContext, NormalizedMenu};
use crate::strategy::{merge_service_results, AcquisitionStrategy, LocationMenu};

/// Meal slugs tried for locations with no configured services.
const DEFAULT_MEALS: &[&str] = &["breakfast", "lunch", "dinner"];

/// How many weeks forward the hours page is advanced before capture.
const HOURS_FORWARD_CLICKS: u32 = 3;

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub base_url: String,
    /// Wait after the page body appears, for client-side rendering.
    pub settle: Duration,
    pub navigation_timeout: Duration,
    /// Ceiling on concurrent page visits across all locations.
    pub concurrency: usize,
}

/// Last-resort strategy that reads the human-facing pages and recovers items
/// from their visible text.
pub struct RenderStrategy {
    fetcher: Arc<dyn PageFetcher>,
    settings: RenderSettings,
    permits: Arc<Semaphore>,
    locations: Vec<LocationConfig>,
}

impl RenderStrategy {
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>, settings: RenderSettings, locations: Vec<LocationConfig>) -> Self {
        let settings = RenderSettings {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            concurrency: settings.concurrency.max(1),
            ..settings
        };
        Self {
            fetcher,
            permits: Arc::new(Semaphore::new(settings.concurrency)),
            settings,
            locations,
        }
    }

    pub(crate) fn menu_url(&self, location_slug: &str, date: NaiveDate, meal_slug: &str) -> String {
        format!(
            "{}/whats-on-the-menu/{location_slug}/{}/{meal_slug}",
            self.settings.base_url,
            date.format("%Y-%m-%d")
        )
    }

    pub(crate) fn hours_url(&self) -> String {
        format!("{}/hours-of-operation", self.settings.base_url)
    }

    fn page_timeout(&self, forward_clicks: u32) -> Duration {
        self.settings.navigation_timeout + self.settings.settle + FORWARD_CLICK_PAUSE * forward_clicks
    }

    /// `(slug, label)` for every meal to visit at `location`.
    fn meals(location: &LocationConfig) -> Vec<(String, String)> {
        if location.services.is_empty() {
            DEFAULT_MEALS
                .iter()
                .map(|slug| ((*slug).to_string(), title_case(slug)))
                .collect()
        } else {
            location
                .services
                .iter()
                .map(|service| (service.slug(), service.meal.clone()))
                .collect()
        }
    }

    async fn load_lines(&self, url: &str, forward_clicks: u32) -> Result<Vec<String>, ScraperError> {
        let _permit = self.permits.acquire().await.map_err(|_| {
            ScraperError::fetch(FetchErrorKind::Network, url, "render pool closed")
        })?;

        let request = PageRequest::new(url, self.settings.settle, self.page_timeout(forward_clicks))
            .with_forward_clicks(forward_clicks);
        let html = self.fetcher.fetch_html(request).await?;
        let lines = visible_lines(&html);

        let text = lines.join("\n");
        if is_anti_bot_page(&text) {
            return Err(ScraperError::fetch(
                FetchErrorKind::AntiBotChallenge,
                url,
                truncate_chars(&text, 180),
            ));
        }
        Ok(lines)
    }

    async fn fetch_meal(
        &self,
        location: &LocationConfig,
        meal_slug: &str,
        meal_label: &str,
        date: NaiveDate,
    ) -> Result<NormalizedMenu, ScraperError> {
        let url = self.menu_url(&location.slug, date, meal_slug);
        let lines = self.load_lines(&url, 0).await?;
        let menu = parse_menu_lines(
            &lines,
            MenuContext {
                location: &location.name,
                meal: meal_label,
                date,
            },
        );
        tracing::debug!(location = %location.name, meal = meal_label, %date, lines = lines.len(), items = menu.items.len(), "rendered menu parsed");
        Ok(menu)
    }
}

#[async_trait]
impl AcquisitionStrategy for RenderStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Render
    }

    async fn fetch_day_menu(
        &self,
        location: &LocationConfig,
        date: NaiveDate,
    ) -> Result<LocationMenu, ScraperError> {
        let meals = Self::meals(location);
        let results = join_all(meals.iter().map(|(slug, label)| async move {
            (label.clone(), self.fetch_meal(location, slug, label, date).await)
        }))
        .await;
        merge_service_results(&location.name, results)
    }

    async fn fetch_week_hours(&self, date: NaiveDate) -> Result<Vec<LocationOperatingTimes>, ScraperError> {
        let url = self.hours_url();
        let lines = self.load_lines(&url, HOURS_FORWARD_CLICKS).await?;
        let names: Vec<String> = self.locations.iter().map(|l| l.name.clone()).collect();
        let hours = parse_hours_lines(&lines, &names, week_start(date));

        if hours.is_empty() {
            return Err(ScraperError::fetch(
                FetchErrorKind::MalformedPayload,
                &url,
                "no configured location found on hours page",
            ));
        }
        Ok(hours)
    }

    fn location_concurrency(&self) -> usize {
        self.settings.concurrency
    }
}
