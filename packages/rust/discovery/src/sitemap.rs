//! `sitemap.xml` strategy with sitemap-index support and crawl fallback.

use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

use frcdocs_crawler::{Crawler, fetch_text};
use frcdocs_shared::{FrcDocsError, Result};

/// Parsed shape of a sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sitemap {
    /// `<sitemapindex>`: locations of child sitemaps.
    Index(Vec<String>),
    /// `<urlset>` (or anything without `<sitemap>` entries): page locations.
    UrlSet(Vec<String>),
}

/// Parse a sitemap document.
///
/// Any `<loc>` nested inside a `<sitemap>` element marks the document as a
/// sitemap index. Element names are matched on their local part so
/// namespace prefixes are tolerated.
pub fn parse_sitemap(xml: &str) -> Result<Sitemap> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut in_sitemap = false;
    let mut in_loc = false;
    let mut current = String::new();
    let mut children = Vec::new();
    let mut pages = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"sitemap" => in_sitemap = true,
                b"loc" => {
                    in_loc = true;
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_loc => {
                let text = e
                    .unescape()
                    .map_err(|err| FrcDocsError::parse(format!("sitemap text: {err}")))?;
                current.push_str(&text);
            }
            Ok(Event::CData(e)) if in_loc => {
                current.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"loc" => {
                    in_loc = false;
                    let loc = current.trim();
                    if !loc.is_empty() {
                        if in_sitemap {
                            children.push(loc.to_string());
                        } else {
                            pages.push(loc.to_string());
                        }
                    }
                }
                b"sitemap" => in_sitemap = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(FrcDocsError::parse(format!("malformed sitemap XML: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    if children.is_empty() {
        Ok(Sitemap::UrlSet(pages))
    } else {
        Ok(Sitemap::Index(children))
    }
}

/// Discover page URLs from `<base>/sitemap.xml`.
///
/// Child sitemaps of an index are fetched best-effort: failures are logged
/// and contribute nothing. When the sitemap is unreachable, malformed or
/// yields no URLs, falls back to a recursive crawl from `base_url`.
pub async fn discover_from_sitemap(client: &Client, base_url: &str, crawl_depth: u32) -> Vec<String> {
    let base = base_url.trim_end_matches('/');
    let sitemap_url = format!("{base}/sitemap.xml");
    info!(%sitemap_url, "trying sitemap");

    let urls = match fetch_text(client, &sitemap_url).await {
        Ok(xml) => match parse_sitemap(&xml) {
            Ok(Sitemap::UrlSet(pages)) => pages,
            Ok(Sitemap::Index(children)) => {
                info!(children = children.len(), "found sitemap index");
                collect_children(client, &children).await
            }
            Err(e) => {
                warn!(%sitemap_url, error = %e, "unparseable sitemap");
                Vec::new()
            }
        },
        Err(e) => {
            info!(%sitemap_url, error = %e, "sitemap not available");
            Vec::new()
        }
    };

    if !urls.is_empty() {
        info!(count = urls.len(), "discovered URLs from sitemap");
        return urls;
    }

    info!(max_depth = crawl_depth, "falling back to recursive crawl");
    match Url::parse(base) {
        Ok(start) => Crawler::new(client.clone(), crawl_depth).crawl(&start).await,
        Err(e) => {
            warn!(%base, error = %e, "invalid base URL, cannot crawl");
            Vec::new()
        }
    }
}

/// Fetch every child sitemap and concatenate their page locations.
async fn collect_children(client: &Client, children: &[String]) -> Vec<String> {
    let mut urls = Vec::new();

    for child in children {
        let xml = match fetch_text(client, child).await {
            Ok(xml) => xml,
            Err(e) => {
                warn!(%child, error = %e, "failed to fetch child sitemap");
                continue;
            }
        };
        match parse_sitemap(&xml) {
            Ok(Sitemap::UrlSet(pages)) => urls.extend(pages),
            Ok(Sitemap::Index(_)) => warn!(%child, "nested sitemap index ignored"),
            Err(e) => warn!(%child, error = %e, "failed to parse child sitemap"),
        }
    }

    urls
}
