//! Per-library document URL discovery.
//!
//! Each documentation site is mapped to a fixed strategy: Sphinx-built
//! sites publish a `searchindex.js` listing every document, the rest are
//! enumerated from `sitemap.xml` with a same-origin crawl as the fallback.

mod searchindex;
mod sitemap;

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use tracing::{info, instrument};

use frcdocs_crawler::build_client;
use frcdocs_shared::{AppConfig, FrcDocsError, Library, Result};

pub use searchindex::{SEARCH_INDEX_PATH, discover_from_search_index, doc_urls, parse_search_index};
pub use sitemap::{Sitemap, discover_from_sitemap, parse_sitemap};

/// Default timeout in seconds for discovery requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default depth of the fallback crawl.
const DEFAULT_CRAWL_DEPTH: u32 = 3;

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// How a library's URLs are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Parse the Sphinx `searchindex.js` document list.
    SearchIndex,
    /// Read `sitemap.xml`, falling back to a recursive crawl.
    Sitemap,
}

/// Fixed library to strategy mapping.
pub fn strategy_for(library: Library) -> Strategy {
    match library {
        Library::WpiLib | Library::CtrePhoenix6 => Strategy::SearchIndex,
        Library::AdvantageKit | Library::RevRobotics | Library::Limelight => Strategy::Sitemap,
    }
}

// ---------------------------------------------------------------------------
// Discovery options
// ---------------------------------------------------------------------------

/// Configuration for the discovery process.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
    /// Maximum depth of the fallback crawl.
    pub crawl_depth: u32,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            crawl_depth: DEFAULT_CRAWL_DEPTH,
        }
    }
}

impl From<&AppConfig> for DiscoveryOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.defaults.timeout_secs,
            crawl_depth: config.defaults.crawl_depth,
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Discover every document URL for `library` from its hosted site.
#[instrument(skip_all, fields(library = %library))]
pub async fn discover(library: Library, opts: &DiscoveryOptions) -> Result<Vec<String>> {
    let client = build_client(Duration::from_secs(opts.timeout_secs))?;
    discover_at(&client, library, library.base_url(), strategy_for(library), opts).await
}

/// Discover URLs under an explicit base URL with an explicit strategy.
///
/// Fails with [`FrcDocsError::Discovery`] when the strategy yields nothing.
/// The result preserves first-seen order with duplicates removed.
pub async fn discover_at(
    client: &Client,
    library: Library,
    base_url: &str,
    strategy: Strategy,
    opts: &DiscoveryOptions,
) -> Result<Vec<String>> {
    let urls = match strategy {
        Strategy::SearchIndex => discover_from_search_index(client, base_url)
            .await
            .map_err(|e| FrcDocsError::discovery(library, e.to_string()))?,
        Strategy::Sitemap => discover_from_sitemap(client, base_url, opts.crawl_depth).await,
    };

    let mut seen = HashSet::new();
    let urls: Vec<String> = urls.into_iter().filter(|u| seen.insert(u.clone())).collect();

    if urls.is_empty() {
        return Err(FrcDocsError::discovery(library, "no document URLs found"));
    }

    info!(count = urls.len(), ?strategy, "discovery complete");
    Ok(urls)
}
