use chrono::NaiveDate;
use nufood_core::StoreError;
use thiserror::Error;

/// Coarse cause of a failed fetch, used for logging, retry decisions and
/// per-location diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    Network,
    NavigationTimeout,
    AntiBotChallenge,
    MalformedPayload,
    LaunchFailure,
}

impl FetchErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FetchErrorKind::Network => "network",
            FetchErrorKind::NavigationTimeout => "navigation_timeout",
            FetchErrorKind::AntiBotChallenge => "anti_bot_challenge",
            FetchErrorKind::MalformedPayload => "malformed_payload",
            FetchErrorKind::LaunchFailure => "launch_failure",
        }
    }
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{kind} ({url}): {message}")]
    Fetch {
        kind: FetchErrorKind,
        url: String,
        message: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("every meal service failed for {location}: {last_error}")]
    AllServicesFailed {
        location: String,
        last_error: Box<ScraperError>,
    },

    /// `kinds` holds the fetch class of each location that failed; it is
    /// empty when the upstream answered but had nothing to offer.
    #[error("no location produced data for {date}")]
    NoDataForAnyLocation {
        date: NaiveDate,
        kinds: Vec<FetchErrorKind>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ScraperError {
    pub(crate) fn fetch(kind: FetchErrorKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            kind,
            url: url.into(),
            message: message.into(),
        }
    }

    /// Maps this error onto the fetch taxonomy.
    ///
    /// Returns `None` for failures that did not come from talking to the
    /// upstream (store writes, aggregate wipeouts).
    #[must_use]
    pub fn kind(&self) -> Option<FetchErrorKind> {
        match self {
            ScraperError::Fetch { kind, .. } => Some(*kind),
            ScraperError::Http(err) => Some(classify_http_error(err)),
            ScraperError::Deserialize { .. } => Some(FetchErrorKind::MalformedPayload),
            ScraperError::UnexpectedStatus { .. } => Some(FetchErrorKind::Network),
            ScraperError::AllServicesFailed { last_error, .. } => last_error.kind(),
            ScraperError::NoDataForAnyLocation { .. } | ScraperError::Store(_) => None,
        }
    }

    /// Stable snake_case label for logs and run summaries.
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        match self {
            ScraperError::Store(_) => "store_write_failure",
            ScraperError::NoDataForAnyLocation { .. } => "no_data_for_any_location",
            other => other.kind().map_or("network", FetchErrorKind::as_str),
        }
    }

    /// Anti-bot pages and store failures are never retried. A wipeout is
    /// not retried either when every location was turned away by a
    /// challenge page.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            ScraperError::Store(_) => false,
            ScraperError::NoDataForAnyLocation { kinds, .. } => {
                kinds.is_empty() || kinds.iter().any(|k| *k != FetchErrorKind::AntiBotChallenge)
            }
            other => other.kind() != Some(FetchErrorKind::AntiBotChallenge),
        }
    }

    /// Whether a caller with a second strategy configured should try it.
    #[must_use]
    pub fn warrants_fallback(&self) -> bool {
        matches!(self, ScraperError::NoDataForAnyLocation { .. })
            || self.kind() == Some(FetchErrorKind::AntiBotChallenge)
    }
}

fn classify_http_error(err: &reqwest::Error) -> FetchErrorKind {
    if err.is_timeout() {
        FetchErrorKind::NavigationTimeout
    } else if err.is_decode() {
        FetchErrorKind::MalformedPayload
    } else {
        FetchErrorKind::Network
    }
}

/// Classifies a browser-side failure from its message.
///
/// Launch problems are recognised by the messages the browser driver emits
/// when the executable is missing or dies during startup.
#[must_use]
pub fn classify_browser_failure(message: &str, timed_out: bool) -> FetchErrorKind {
    let lower = message.to_ascii_lowercase();
    if lower.contains("failed to start")
        || lower.contains("could not auto detect")
        || lower.contains("no such file or directory")
        || lower.contains("websocket url could be resolved")
    {
        FetchErrorKind::LaunchFailure
    } else if timed_out || lower.contains("deadline exceeded") || lower.contains("timed out") {
        FetchErrorKind::NavigationTimeout
    } else {
        FetchErrorKind::Network
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_messages_classify_as_launch_failure() {
        assert_eq!(
            classify_browser_failure("chrome failed to start: exit status 1", false),
            FetchErrorKind::LaunchFailure
        );
        assert_eq!(
            classify_browser_failure("Could not auto detect a chrome executable", false),
            FetchErrorKind::LaunchFailure
        );
    }

    #[test]
    fn launch_wins_over_timeout() {
        assert_eq!(
            classify_browser_failure("failed to start within deadline", true),
            FetchErrorKind::LaunchFailure
        );
    }

    #[test]
    fn deadline_classifies_as_navigation_timeout() {
        assert_eq!(
            classify_browser_failure("context deadline exceeded", false),
            FetchErrorKind::NavigationTimeout
        );
        assert_eq!(
            classify_browser_failure("websocket closed", true),
            FetchErrorKind::NavigationTimeout
        );
    }

    #[test]
    fn anything_else_is_network() {
        assert_eq!(
            classify_browser_failure("connection reset by peer", false),
            FetchErrorKind::Network
        );
    }

    #[test]
    fn launch_as_a_plain_word_is_not_a_launch_failure() {
        assert_eq!(
            classify_browser_failure("page relaunched after navigation: connection reset", false),
            FetchErrorKind::Network
        );
        assert_eq!(
            classify_browser_failure("launch button click intercepted", true),
            FetchErrorKind::NavigationTimeout
        );
        assert_eq!(
            classify_browser_failure("no websocket url could be resolved", false),
            FetchErrorKind::LaunchFailure
        );
    }

    #[test]
    fn anti_bot_is_not_retriable() {
        let err = ScraperError::fetch(FetchErrorKind::AntiBotChallenge, "http://x", "Attention Required!");
        assert!(!err.is_retriable());
        assert_eq!(err.class_name(), "anti_bot_challenge");
    }

    #[test]
    fn all_services_failed_inherits_inner_kind() {
        let inner = ScraperError::fetch(FetchErrorKind::MalformedPayload, "http://x", "bad json");
        let err = ScraperError::AllServicesFailed {
            location: "Elder".into(),
            last_error: Box::new(inner),
        };
        assert_eq!(err.kind(), Some(FetchErrorKind::MalformedPayload));
        assert!(err.is_retriable());
    }

    #[test]
    fn fallback_on_wipeout_or_challenge_only() {
        let wipeout = ScraperError::NoDataForAnyLocation {
            date: NaiveDate::from_ymd_opt(2024, 12, 16).unwrap(),
            kinds: vec![FetchErrorKind::Network],
        };
        assert!(wipeout.warrants_fallback());
        assert!(ScraperError::fetch(FetchErrorKind::AntiBotChallenge, "http://x", "blocked").warrants_fallback());
        assert!(!ScraperError::fetch(FetchErrorKind::Network, "http://x", "reset").warrants_fallback());
    }

    #[test]
    fn wipeout_by_challenges_alone_is_not_retried() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 16).unwrap();
        let blocked = ScraperError::NoDataForAnyLocation {
            date,
            kinds: vec![FetchErrorKind::AntiBotChallenge; 5],
        };
        assert!(!blocked.is_retriable());
        assert!(blocked.warrants_fallback());

        let mixed = ScraperError::NoDataForAnyLocation {
            date,
            kinds: vec![FetchErrorKind::AntiBotChallenge, FetchErrorKind::Network],
        };
        assert!(mixed.is_retriable());

        let empty = ScraperError::NoDataForAnyLocation { date, kinds: Vec::new() };
        assert!(empty.is_retriable());
    }

    #[test]
    fn aggregate_errors_have_no_fetch_kind() {
        let err = ScraperError::NoDataForAnyLocation {
            date: NaiveDate::from_ymd_opt(2024, 12, 16).unwrap(),
            kinds: Vec::new(),
        };
        assert_eq!(err.kind(), None);
        assert_eq!(err.class_name(), "no_data_for_any_location");
    }
}
