use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use nufood_core::{LocationConfig, LocationOperatingTimes, StrategyKind};

use super::page::decode_api_page;
use super::{PageFetcher, PageRequest};
use crate::error::ScraperError;
use crate::hours::convert_weekly_schedule;
use crate::normalize::{normalize_categories, MenuContext, NormalizedMenu};
use crate::strategy::{merge_service_results, AcquisitionStrategy, LocationMenu};
use crate::types::{PeriodMenuResponse, PeriodsResponse, WeeklyScheduleResponse};

/// JSON endpoints render quickly; this only covers the raw-text viewer.
const API_SETTLE: Duration = Duration::from_millis(1200);

const PERIODS_TIMEOUT: Duration = Duration::from_secs(20);

/// Drives a browser to the machine-readable endpoints and decodes the JSON
/// it displays. Used when plain HTTP clients are challenged upstream.
pub struct BrowserApiStrategy {
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
    site_id: String,
    navigation_timeout: Duration,
}

impl BrowserApiStrategy {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        base_url: &str,
        site_id: &str,
        navigation_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            site_id: site_id.to_string(),
            navigation_timeout,
        }
    }

    pub(crate) fn periods_url(&self, location_id: &str, date: NaiveDate) -> String {
        format!(
            "{}/locations/{location_id}/periods/?date={}",
            self.base_url,
            date.format("%Y-%m-%d")
        )
    }

    pub(crate) fn menu_url(&self, location_id: &str, period_id: &str, date: NaiveDate) -> String {
        format!(
            "{}/locations/{location_id}/menu?date={}&period={period_id}",
            self.base_url,
            date.format("%Y-%m-%d")
        )
    }

    pub(crate) fn schedule_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/locations/weekly_schedule?site_id={}&date={}",
            self.base_url,
            self.site_id,
            date.format("%Y-%m-%d")
        )
    }

    async fn load<T: serde::de::DeserializeOwned>(&self, url: &str, timeout: Duration) -> Result<T, ScraperError> {
        let html = self
            .fetcher
            .fetch_html(PageRequest::new(url, API_SETTLE, timeout))
            .await?;
        decode_api_page(url, &html)
    }

    async fn fetch_period(
        &self,
        location: &LocationConfig,
        period_id: &str,
        meal: &str,
        date: NaiveDate,
    ) -> Result<NormalizedMenu, ScraperError> {
        let url = self.menu_url(&location.id, period_id, date);
        let response: PeriodMenuResponse = self.load(&url, self.navigation_timeout).await?;
        Ok(normalize_categories(
            &response.period.categories,
            MenuContext {
                location: &location.name,
                meal,
                date,
            },
        ))
    }
}

#[async_trait]
impl AcquisitionStrategy for BrowserApiStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BrowserApi
    }

    async fn fetch_day_menu(
        &self,
        location: &LocationConfig,
        date: NaiveDate,
    ) -> Result<LocationMenu, ScraperError> {
        let periods_url = self.periods_url(&location.id, date);
        let periods: PeriodsResponse = self
            .load(&periods_url, PERIODS_TIMEOUT.max(self.navigation_timeout))
            .await?;

        if periods.periods.is_empty() {
            tracing::debug!(location = %location.name, %date, "no meal periods published");
            return Ok(LocationMenu::closed(&location.name));
        }

        let mut results = Vec::with_capacity(periods.periods.len());
        for period in &periods.periods {
            let result = self.fetch_period(location, &period.id, &period.name, date).await;
            results.push((period.name.clone(), result));
        }
        merge_service_results(&location.name, results)
    }

    async fn fetch_week_hours(&self, date: NaiveDate) -> Result<Vec<LocationOperatingTimes>, ScraperError> {
        let url = self.schedule_url(date);
        let response: WeeklyScheduleResponse = self.load(&url, self.navigation_timeout).await?;
        convert_weekly_schedule(&url, &response.the_locations)
    }
}
