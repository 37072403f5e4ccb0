//! Plain-HTTP strategy against the machine-readable endpoints.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use nufood_core::{LocationConfig, LocationOperatingTimes, StrategyKind};
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::ScraperError;
use crate::hours::convert_weekly_schedule;
use crate::normalize::{normalize_categories, MenuContext, NormalizedMenu};
use crate::strategy::{merge_service_results, AcquisitionStrategy, LocationMenu};
use crate::types::{ServiceMenuResponse, WeeklyScheduleResponse};

/// Fetches each configured (location, meal service) pair with one request.
///
/// Requests run sequentially. Retrying is left to the caller.
pub struct DirectApiStrategy {
    client: Client,
    base_url: String,
    site_id: String,
}

impl DirectApiStrategy {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        site_id: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            site_id: site_id.to_string(),
        })
    }

    pub(crate) fn service_url(&self, location_id: &str, service_id: &str, date: NaiveDate) -> String {
        format!(
            "{}/location/{location_id}/periods/{service_id}?platform=0&date={}",
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

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<T>(&body).map_err(|source| ScraperError::Deserialize {
            context: url.to_string(),
            source,
        })
    }

    async fn fetch_service(
        &self,
        location: &LocationConfig,
        service_id: &str,
        meal: &str,
        date: NaiveDate,
    ) -> Result<NormalizedMenu, ScraperError> {
        let url = self.service_url(&location.id, service_id, date);
        let response: ServiceMenuResponse = self.get_json(&url).await?;

        if response.closed {
            tracing::debug!(location = %location.name, meal, %date, "service reported closed");
            return Ok(NormalizedMenu::default());
        }

        Ok(normalize_categories(
            &response.menu.periods.categories,
            MenuContext {
                location: &location.name,
                meal,
                date,
            },
        ))
    }
}

#[async_trait]
impl AcquisitionStrategy for DirectApiStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Direct
    }

    async fn fetch_day_menu(
        &self,
        location: &LocationConfig,
        date: NaiveDate,
    ) -> Result<LocationMenu, ScraperError> {
        let mut results = Vec::with_capacity(location.services.len());
        for service in &location.services {
            let result = self
                .fetch_service(location, &service.id, &service.meal, date)
                .await;
            results.push((service.meal.clone(), result));
        }
        merge_service_results(&location.name, results)
    }

    async fn fetch_week_hours(&self, date: NaiveDate) -> Result<Vec<LocationOperatingTimes>, ScraperError> {
        let url = self.schedule_url(date);
        let response: WeeklyScheduleResponse = self.get_json(&url).await?;
        convert_weekly_schedule(&url, &response.the_locations)
    }
}
