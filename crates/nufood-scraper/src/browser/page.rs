//! Pure helpers over captured page HTML.

use scraper::{Html, Selector};
use serde::de::DeserializeOwned;

use crate::error::{FetchErrorKind, ScraperError};

const SNIPPET_CHARS: usize = 180;

/// Every non-blank text node in document order, trimmed.
///
/// Text inside `script`, `style`, `noscript` and `template` is skipped.
#[must_use]
pub fn visible_lines(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_owned()))
            .is_some_and(|name| matches!(name.as_str(), "script" | "style" | "noscript" | "template"));
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }

    lines
}

/// First `<pre>` element's text, as browsers render raw JSON documents.
#[must_use]
pub fn pre_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("pre").ok()?;
    document
        .select(&selector)
        .next()
        .map(|pre| pre.text().collect::<String>())
}

/// Interstitial challenge pages served instead of the requested resource.
#[must_use]
pub fn is_anti_bot_page(text: &str) -> bool {
    text.to_lowercase().contains("cloudflare") || text.contains("Attention Required!")
}

/// Decodes the JSON a browser shows for an API URL.
///
/// Anti-bot markers are checked before anything else so a challenge page is
/// never reported as a parse failure.
///
/// # Errors
///
/// `anti_bot_challenge` when the page is an interstitial, `malformed_payload`
/// when there is no `<pre>` payload or it does not decode into `T`.
pub fn decode_api_page<T: DeserializeOwned>(url: &str, html: &str) -> Result<T, ScraperError> {
    let text = visible_lines(html).join("\n");
    if is_anti_bot_page(&text) {
        return Err(ScraperError::fetch(
            FetchErrorKind::AntiBotChallenge,
            url,
            truncate_chars(&text, SNIPPET_CHARS),
        ));
    }

    let Some(payload) = pre_text(html) else {
        return Err(ScraperError::fetch(
            FetchErrorKind::MalformedPayload,
            url,
            "missing <pre> json payload",
        ));
    };

    serde_json::from_str::<T>(payload.trim()).map_err(|e| {
        ScraperError::fetch(
            FetchErrorKind::MalformedPayload,
            url,
            format!("{e}: {}", truncate_chars(&payload, SNIPPET_CHARS)),
        )
    })
}

#[must_use]
pub fn truncate_chars(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PeriodsResponse;

    const PERIODS_PAGE: &str = r#"<html><head></head><body><pre style="word-wrap: break-word; white-space: pre-wrap;">{"locationId":"5b33ae291178e909d807593d","date":"2024-12-16","periods":[{"id":"p1","name":"Breakfast","slug":"breakfast"},{"id":"p2","name":"Lunch","slug":"lunch"}]}</pre></body></html>"#;

    const CHALLENGE_PAGE: &str = r"<html><head><title>Attention Required! | Cloudflare</title></head><body><h1>Sorry, you have been blocked</h1><p>Cloudflare Ray ID: 1234</p></body></html>";

    #[test]
    fn decodes_pre_payload() {
        let periods: PeriodsResponse = decode_api_page("http://test", PERIODS_PAGE).unwrap();
        assert_eq!(periods.periods.len(), 2);
        assert_eq!(periods.periods[1].name, "Lunch");
    }

    #[test]
    fn challenge_page_is_anti_bot() {
        let err = decode_api_page::<PeriodsResponse>("http://test", CHALLENGE_PAGE).unwrap_err();
        assert_eq!(err.kind(), Some(FetchErrorKind::AntiBotChallenge));
    }

    #[test]
    fn anti_bot_wins_over_missing_payload() {
        let html = "<html><body><pre>not json</pre><p>checking your browser - cloudflare</p></body></html>";
        let err = decode_api_page::<PeriodsResponse>("http://test", html).unwrap_err();
        assert_eq!(err.kind(), Some(FetchErrorKind::AntiBotChallenge));
    }

    #[test]
    fn missing_pre_is_malformed() {
        let err = decode_api_page::<PeriodsResponse>("http://test", "<html><body>hi</body></html>").unwrap_err();
        assert_eq!(err.kind(), Some(FetchErrorKind::MalformedPayload));
        assert!(err.to_string().contains("missing <pre>"));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let html = "<html><body><pre>{\"periods\": [</pre></body></html>";
        let err = decode_api_page::<PeriodsResponse>("http://test", html).unwrap_err();
        assert_eq!(err.kind(), Some(FetchErrorKind::MalformedPayload));
    }

    #[test]
    fn visible_lines_skip_scripts_and_blank_nodes() {
        let html = "<html><head><script>var x = 1;</script><style>p{}</style></head>\
                    <body><h2>Comfort</h2>\n  <p> Pancakes </p><p>   </p></body></html>";
        assert_eq!(visible_lines(html), vec!["Comfort", "Pancakes"]);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }
}
