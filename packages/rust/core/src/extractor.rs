//! Content extraction: fetch pages, strip chrome, convert with a generator.
//!
//! URLs are processed in fixed-size batches. Every URL in a batch runs as its
//! own task; a failure yields no page for that URL and never touches its
//! siblings. Batches run strictly one after another with a pause between
//! them to stay under the generative service's rate limits.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use frcdocs_crawler::fetch_html;
use frcdocs_markdown::{extract_title, strip_boilerplate};
use frcdocs_shared::{ExtractionConfig, Library, Page, page_id_from_url};

use crate::generator::TextGenerator;
use crate::pipeline::ProgressReporter;

/// Instruction sent ahead of the stripped HTML.
pub const CONVERSION_PROMPT: &str = "Convert this HTML documentation page to clean markdown.
Preserve: code blocks with language tags, headers, tables, lists, links.
For images: keep the original src URL as a markdown image.
Remove: any remaining navigation, breadcrumbs, or footer content.
Do NOT wrap the output in a code fence.

HTML:
";

/// Batch and size limits for extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// URLs processed concurrently per batch.
    pub batch_size: usize,
    /// Pause between consecutive batches.
    pub batch_delay: Duration,
    /// Stripped HTML is cut to this many characters.
    pub max_html_chars: usize,
    /// Stripped HTML shorter than this is not worth converting.
    pub min_body_chars: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::from(&ExtractionConfig::default())
    }
}

impl From<&ExtractionConfig> for ExtractOptions {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            max_html_chars: config.max_html_chars,
            min_body_chars: config.min_body_chars,
        }
    }
}

/// Converts hosted HTML pages into [`Page`] records.
pub struct ContentExtractor<G> {
    client: Client,
    generator: Arc<G>,
    opts: ExtractOptions,
}

impl<G: TextGenerator + 'static> ContentExtractor<G> {
    pub fn new(client: Client, generator: Arc<G>, opts: ExtractOptions) -> Self {
        Self {
            client,
            generator,
            opts,
        }
    }

    /// Extract a page from every URL that yields usable content.
    ///
    /// Pages come back batch by batch; within a batch they are in
    /// completion order.
    #[instrument(skip_all, fields(library = %library, urls = urls.len()))]
    pub async fn extract(
        &self,
        urls: &[String],
        library: Library,
        progress: &dyn ProgressReporter,
    ) -> Vec<Page> {
        let batch_size = self.opts.batch_size.max(1);
        let total_batches = urls.len().div_ceil(batch_size);
        let mut pages = Vec::new();
        let mut processed = 0;

        for (batch_idx, batch) in urls.chunks(batch_size).enumerate() {
            info!(
                batch = batch_idx + 1,
                total_batches,
                size = batch.len(),
                "processing batch"
            );

            let mut join_set = JoinSet::new();
            for url in batch {
                let client = self.client.clone();
                let generator = Arc::clone(&self.generator);
                let opts = self.opts.clone();
                let url = url.clone();
                join_set.spawn(async move {
                    let page = extract_page(&client, generator.as_ref(), &url, library, &opts).await;
                    (url, page)
                });
            }

            while let Some(joined) = join_set.join_next().await {
                processed += 1;
                let Ok((url, page)) = joined else {
                    warn!("extraction task panicked");
                    continue;
                };
                progress.page_extracted(&url, processed, urls.len());
                if let Some(page) = page {
                    debug!(%url, title = %page.title, tokens = page.tokens, "extracted");
                    pages.push(page);
                }
            }

            if batch_idx + 1 < total_batches && !self.opts.batch_delay.is_zero() {
                debug!(delay_ms = self.opts.batch_delay.as_millis() as u64, "waiting before next batch");
                tokio::time::sleep(self.opts.batch_delay).await;
            }
        }

        info!(extracted = pages.len(), total = urls.len(), "extraction complete");
        pages
    }
}

/// Fetch, strip and convert one URL. `None` means the URL produced no page;
/// the reason is logged.
pub async fn extract_page<G: TextGenerator>(
    client: &Client,
    generator: &G,
    url: &str,
    library: Library,
    opts: &ExtractOptions,
) -> Option<Page> {
    let Some(html) = fetch_html(client, url).await else {
        warn!(%url, "failed to fetch");
        return None;
    };

    let stripped = strip_boilerplate(&html, opts.max_html_chars);
    if stripped.chars().count() < opts.min_body_chars {
        debug!(%url, "skipping thin page");
        return None;
    }

    let prompt = format!("{CONVERSION_PROMPT}{stripped}");
    let content = match generator.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(%url, error = %e, "conversion failed");
            return None;
        }
    };
    if content.is_empty() {
        warn!(%url, "empty conversion response");
        return None;
    }

    let title = extract_title(&content, Some(url));
    Some(Page::new(page_id_from_url(url), title, library, url, content))
}
