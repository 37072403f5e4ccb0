use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::{PageFetcher, PageRequest, FORWARD_CLICK_PAUSE, FORWARD_CONTROL_SELECTOR};
use crate::error::{classify_browser_failure, FetchErrorKind, ScraperError};

const CHROME_CANDIDATES: &[&str] = &[
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
];

/// Picks the browser executable: the configured path if any, otherwise the
/// first well-known install location that exists.
///
/// Returns `None` when nothing is found, leaving discovery to the driver.
#[must_use]
pub fn resolve_chrome_path(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        return Some(path.to_path_buf());
    }
    CHROME_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

/// One headless browser process. Every request gets its own tab, which is
/// closed afterwards whether or not the visit succeeded.
pub struct ChromeFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromeFetcher {
    /// # Errors
    ///
    /// Returns a `launch_failure` fetch error if the executable cannot be
    /// found or the process does not start.
    pub async fn launch(chrome_bin: Option<&Path>, user_agent: &str) -> Result<Self, ScraperError> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={user_agent}"));

        let executable = resolve_chrome_path(chrome_bin);
        if let Some(path) = &executable {
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|e| ScraperError::fetch(FetchErrorKind::LaunchFailure, "browser://launch", e))?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            ScraperError::fetch(
                FetchErrorKind::LaunchFailure,
                "browser://launch",
                format!("browser failed to start: {e}"),
            )
        })?;

        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        tracing::info!(
            executable = executable.as_deref().map_or_else(|| "auto".into(), |p| p.display().to_string()),
            "headless browser launched"
        );

        Ok(Self { browser, handler })
    }
}

impl Drop for ChromeFetcher {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn timeout_error(url: &str, limit: Duration) -> ScraperError {
    ScraperError::fetch(
        FetchErrorKind::NavigationTimeout,
        url,
        format!("no response within {}s", limit.as_secs()),
    )
}

fn cdp_kind(err: &CdpError) -> FetchErrorKind {
    match err {
        CdpError::LaunchExit(..) | CdpError::LaunchTimeout(_) | CdpError::LaunchIo(..) => {
            FetchErrorKind::LaunchFailure
        }
        CdpError::Timeout => FetchErrorKind::NavigationTimeout,
        other => classify_browser_failure(&other.to_string(), false),
    }
}

fn cdp_error(url: &str, err: &CdpError) -> ScraperError {
    ScraperError::fetch(cdp_kind(err), url, err.to_string())
}

/// Opens a page, visits it and closes it, with opening and visiting sharing
/// one `limit`. An opened page is closed even when the visit runs out of
/// time.
async fn visit_within<P, OpenFut, VisitFut, CloseFut>(
    url: &str,
    limit: Duration,
    open: OpenFut,
    visit: impl FnOnce(P) -> VisitFut,
    close: impl FnOnce(P) -> CloseFut,
) -> Result<String, ScraperError>
where
    P: Clone,
    OpenFut: Future<Output = Result<P, ScraperError>>,
    VisitFut: Future<Output = Result<String, ScraperError>>,
    CloseFut: Future<Output = ()>,
{
    let deadline = tokio::time::Instant::now() + limit;
    let page = match tokio::time::timeout_at(deadline, open).await {
        Err(_) => return Err(timeout_error(url, limit)),
        Ok(opened) => opened?,
    };

    let outcome = tokio::time::timeout_at(deadline, visit(page.clone())).await;
    close(page).await;

    match outcome {
        Err(_) => Err(timeout_error(url, limit)),
        Ok(result) => result,
    }
}

async fn capture(page: &Page, request: PageRequest<'_>) -> Result<String, ScraperError> {
    let url = request.url;
    page.wait_for_navigation().await.map_err(|e| cdp_error(url, &e))?;
    page.find_element("body").await.map_err(|e| cdp_error(url, &e))?;

    if !request.settle.is_zero() {
        tokio::time::sleep(request.settle).await;
    }

    for click in 0..request.forward_clicks {
        let control = match page.find_element(FORWARD_CONTROL_SELECTOR).await {
            Ok(control) => control,
            Err(e) => {
                tracing::debug!(url, click, error = %e, "forward control not found");
                break;
            }
        };
        if let Err(e) = control.click().await {
            tracing::debug!(url, click, error = %e, "forward control click failed");
            break;
        }
        tokio::time::sleep(FORWARD_CLICK_PAUSE).await;
    }

    page.content().await.map_err(|e| cdp_error(url, &e))
}

#[async_trait]
impl PageFetcher for ChromeFetcher {
    async fn fetch_html(&self, request: PageRequest<'_>) -> Result<String, ScraperError> {
        let url = request.url;
        visit_within(
            url,
            request.timeout,
            async { self.browser.new_page(url).await.map_err(|e| cdp_error(url, &e)) },
            |page: Page| async move { capture(&page, request).await },
            |page: Page| async move {
                if let Err(e) = page.close().await {
                    tracing::debug!(url, error = %e, "tab close failed");
                }
            },
        )
        .await
    }
}
