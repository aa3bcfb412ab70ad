//! Page title lookup for links saved without a name.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::debug;

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_TITLE_CHARS: usize = 200;
const FALLBACK_TITLE: &str = "Saved Link";
const BROWSER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko)";

static TITLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").expect("Invalid title regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Title from the page's `<title>`, else the URL host, else `"Saved Link"`.
///
/// Never fails: any fetch problem falls through to the next option.
pub async fn resolve_title(url: &str) -> String {
    match fetch_title(url).await {
        Some(title) => title,
        None => fallback_title(url),
    }
}

async fn fetch_title(url: &str) -> Option<String> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(BROWSER_AGENT)
        .build()
        .ok()?;
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(err) => {
            debug!(url = %url, error = %err, "title fetch failed");
            return None;
        }
    };
    if !response.status().is_success() {
        debug!(
            url = %url,
            status = response.status().as_u16(),
            "title fetch returned an error status"
        );
        return None;
    }
    let html = response.text().await.ok()?;
    extract_title(&html)
}

/// Collapse whitespace and cap length; `None` for a blank title.
pub fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE_PATTERN.captures(html)?.get(1)?.as_str();
    let title = WHITESPACE.replace_all(raw.trim(), " ");
    if title.is_empty() {
        return None;
    }
    Some(title.chars().take(MAX_TITLE_CHARS).collect())
}

/// The URL host, or `"Saved Link"` when there is none.
pub fn fallback_title(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}
