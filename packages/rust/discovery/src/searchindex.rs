//! Sphinx `searchindex.js` strategy.
//!
//! Sphinx publishes its search index as JSON wrapped in a function call:
//! `Search.setIndex({...})`. The document-name list under `docnames` (or
//! `filenames` in older builds) enumerates every page on the site.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use tracing::info;

use frcdocs_crawler::fetch_text;
use frcdocs_shared::{FrcDocsError, Result};

/// Path of the index resource under the library base URL.
pub const SEARCH_INDEX_PATH: &str = "searchindex.js";

/// Matches `Identifier({...})` with an optional trailing semicolon.
static WRAPPER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[\w$.]+\(\s*(\{[\s\S]*\})\s*\)\s*;?\s*$").expect("wrapper regex")
});

/// Fetch `<base>/searchindex.js` and return one URL per document.
pub async fn discover_from_search_index(client: &Client, base_url: &str) -> Result<Vec<String>> {
    let base = base_url.trim_end_matches('/');
    let index_url = format!("{base}/{SEARCH_INDEX_PATH}");
    info!(%index_url, "fetching search index");

    let text = fetch_text(client, &index_url).await?;
    let names = parse_search_index(&text)?;
    let urls = doc_urls(base, &names);

    info!(count = urls.len(), "discovered URLs from search index");
    Ok(urls)
}

/// Unwrap the JavaScript call and read the document-name list.
pub fn parse_search_index(text: &str) -> Result<Vec<String>> {
    let payload = WRAPPER_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| FrcDocsError::parse("search index is not wrapped in Identifier({...})"))?
        .as_str();

    let index: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| FrcDocsError::parse(format!("search index payload is not JSON: {e}")))?;

    let list = index
        .get("docnames")
        .or_else(|| index.get("filenames"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| FrcDocsError::parse("search index has no docnames or filenames list"))?;

    let names: Vec<String> = list
        .iter()
        .filter_map(|v| v.as_str())
        .map(str::to_string)
        .collect();

    if names.is_empty() {
        return Err(FrcDocsError::parse("search index document list is empty"));
    }
    Ok(names)
}

/// Join each document name to `base`, normalizing to a single `.html` suffix.
pub fn doc_urls(base: &str, names: &[String]) -> Vec<String> {
    let base = base.trim_end_matches('/');
    names
        .iter()
        .map(|name| {
            let clean = name.strip_suffix(".html").unwrap_or(name);
            format!("{base}/{clean}.html")
        })
        .collect()
}
