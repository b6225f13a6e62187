//! HTTP client construction and best-effort page fetching.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use frcdocs_shared::{FrcDocsError, Result};

/// User-Agent string for every outbound request.
pub const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; frc-docs/",
    env!("CARGO_PKG_VERSION"),
    "; documentation indexer)"
);

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 5;

/// Build a reqwest client with the shared user agent and timeout.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(timeout)
        .build()
        .map_err(|e| FrcDocsError::Network(format!("failed to build HTTP client: {e}")))
}

/// Fetch `url` and return its body, failing on transport errors or non-2xx status.
pub async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FrcDocsError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FrcDocsError::Network(format!("{url}: HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| FrcDocsError::Network(format!("{url}: failed to read body: {e}")))
}

/// Fetch `url` as an HTML document.
///
/// Returns `None` (and logs at debug) when the request fails, the status is
/// not a success, or the response is not `text/html`.
pub async fn fetch_html(client: &Client, url: &str) -> Option<String> {
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            debug!(%url, error = %e, "fetch failed");
            return None;
        }
    };

    let status = response.status();
    if !status.is_success() {
        debug!(%url, %status, "non-success status");
        return None;
    }

    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("text/html"));
    if !is_html {
        debug!(%url, "not an HTML response");
        return None;
    }

    match response.text().await {
        Ok(body) => Some(body),
        Err(e) => {
            debug!(%url, error = %e, "failed to read body");
            None
        }
    }
}
