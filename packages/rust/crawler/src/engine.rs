//! Breadth-first, same-origin link crawler.
//!
//! Used as the last-resort URL source when a site publishes no usable
//! sitemap. Traversal is sequential with a work queue; the only bound on
//! growth besides depth and origin filtering is the seen-set.

use std::collections::{HashSet, VecDeque};

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use crate::client::fetch_html;

/// Link targets with these extensions are never followed.
const ASSET_EXTENSIONS: &[&str] = &[
    "css", "js", "png", "jpg", "jpeg", "gif", "svg", "ico", "pdf", "zip",
];

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Sequential BFS crawler bounded by depth and origin.
pub struct Crawler {
    client: Client,
    max_depth: u32,
}

impl Crawler {
    /// Create a crawler that descends at most `max_depth` links from the start page.
    pub fn new(client: Client, max_depth: u32) -> Self {
        Self { client, max_depth }
    }

    /// Crawl from `start_url` and return the URLs of every HTML page fetched,
    /// in visit order.
    ///
    /// Unreachable and non-HTML pages are skipped without aborting the crawl.
    /// A URL is fetched at most once.
    #[instrument(skip_all, fields(start_url = %start_url, max_depth = self.max_depth))]
    pub async fn crawl(&self, start_url: &Url) -> Vec<String> {
        let origin = start_url.origin();
        let mut start = start_url.clone();
        start.set_fragment(None);

        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(normalize_url(&start));

        let mut queue: VecDeque<(Url, u32)> = VecDeque::from([(start, 0)]);
        let mut pages: Vec<String> = Vec::new();

        info!("starting recursive crawl");

        while let Some((url, depth)) = queue.pop_front() {
            debug!(%url, depth, "visiting");

            let Some(html) = fetch_html(&self.client, url.as_str()).await else {
                continue;
            };
            pages.push(url.to_string());

            if depth >= self.max_depth {
                continue;
            }

            for link in extract_links(&html, &url) {
                if link.origin() != origin {
                    continue;
                }
                if seen.insert(normalize_url(&link)) {
                    queue.push_back((link, depth + 1));
                }
            }
        }

        info!(pages = pages.len(), seen = seen.len(), "crawl completed");
        pages
    }
}

// ---------------------------------------------------------------------------
// Link extraction
// ---------------------------------------------------------------------------

/// Extract followable links from a document, resolved against `base_url`
/// with fragments removed.
///
/// Skips fragment-only, `mailto:` and `javascript:` hrefs and links to
/// static assets. Origin filtering is left to the caller.
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    let doc = Html::parse_document(html);
    let Ok(link_sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let mut links = Vec::new();

    for el in doc.select(&link_sel) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let href = href.trim();

        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
        {
            continue;
        }

        let Ok(mut resolved) = base_url.join(href) else {
            continue;
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        if is_asset(&resolved) {
            continue;
        }

        resolved.set_fragment(None);
        links.push(resolved);
    }

    links
}

/// Whether the URL path ends in a static asset extension.
fn is_asset(url: &Url) -> bool {
    let path = url.path();
    let Some((_, ext)) = path.rsplit_once('.') else {
        return false;
    };
    if ext.contains('/') {
        return false;
    }
    ASSET_EXTENSIONS
        .iter()
        .any(|asset| asset.eq_ignore_ascii_case(ext))
}

/// Normalize a URL for deduplication (strip fragment, trailing slash except at root).
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    let mut s = normalized.to_string();
    if s.ends_with('/') && normalized.path() != "/" {
        s.pop();
    }
    s
}
