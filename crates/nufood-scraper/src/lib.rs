pub mod browser;
pub mod dedup;
pub mod direct;
pub mod error;
pub mod filter;
pub mod hours;
pub mod normalize;
pub mod orchestrator;
pub mod retry;
pub mod strategy;
pub mod types;
pub mod window;

pub use browser::{BrowserApiStrategy, ChromeFetcher, PageFetcher, PageRequest, RenderSettings, RenderStrategy};
pub use dedup::net_new_names;
pub use direct::DirectApiStrategy;
pub use error::{FetchErrorKind, ScraperError};
pub use normalize::{normalize_categories, MenuContext, NormalizedMenu};
pub use orchestrator::{
    AdvanceSummary, DailySummary, HoursSummary, LocationFailure, Orchestrator, RebuildSummary, ScrapeOutcome,
    ScrapeState,
};
pub use retry::{with_retry, RetryPolicy};
pub use strategy::{build_strategy, AcquisitionStrategy, LocationMenu};
pub use window::{DayBatch, WindowMaintainer};
