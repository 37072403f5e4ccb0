//! Headless-browser strategies.
//!
//! Browser access sits behind [`PageFetcher`], which only knows how to load
//! a URL and hand back the rendered HTML. Everything that interprets that
//! HTML lives in pure functions so it can be tested against recorded pages.

mod api;
pub mod hours_text;
mod launch;
pub mod menu_text;
pub mod page;
mod render;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScraperError;

pub use api::BrowserApiStrategy;
pub use launch::{resolve_chrome_path, ChromeFetcher};
pub use render::{RenderSettings, RenderStrategy};

/// Selector for the hours page's calendar-forward control.
pub const FORWARD_CONTROL_SELECTOR: &str =
    r#"button[aria-label*="next" i], button:has(svg), .next-week, button.next"#;

/// Pause after each click on the calendar-forward control.
pub const FORWARD_CLICK_PAUSE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub url: &'a str,
    /// Wait after the body appears, for client-side rendering.
    pub settle: Duration,
    /// Upper bound on the whole page visit.
    pub timeout: Duration,
    /// Clicks on [`FORWARD_CONTROL_SELECTOR`] before capturing. Stops early
    /// when the control cannot be found.
    pub forward_clicks: u32,
}

impl<'a> PageRequest<'a> {
    #[must_use]
    pub fn new(url: &'a str, settle: Duration, timeout: Duration) -> Self {
        Self {
            url,
            settle,
            timeout,
            forward_clicks: 0,
        }
    }

    #[must_use]
    pub fn with_forward_clicks(mut self, clicks: u32) -> Self {
        self.forward_clicks = clicks;
        self
    }
}

/// Loads a page in a fresh tab and returns its HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`ScraperError::Fetch`] classified as `navigation_timeout`,
    /// `launch_failure` or `network`.
    async fn fetch_html(&self, request: PageRequest<'_>) -> Result<String, ScraperError>;
}
