//! End-to-end `scrape` pipeline: per-library ingestion → index → bundle.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{error, info, instrument};

use frcdocs_crawler::build_client;
use frcdocs_discovery::{DiscoveryOptions, Strategy, discover_at, strategy_for};
use frcdocs_shared::{AppConfig, Library, LibraryCount, Page, Result};
use frcdocs_storage::Bundle;

use crate::extractor::{ContentExtractor, ExtractOptions};
use crate::generator::{GeminiGenerator, TextGenerator};
use crate::source::extract_wpilib;

/// Where one library's pages come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Shallow clone of the reStructuredText sources.
    SourceTree,
    /// Hosted site: discover URLs, then extract each page.
    Hosted { base_url: String, strategy: Strategy },
}

impl Source {
    /// The fixed routing for `library`.
    pub fn for_library(library: Library) -> Self {
        if library.from_source_tree() {
            Self::SourceTree
        } else {
            Self::Hosted {
                base_url: library.base_url().to_string(),
                strategy: strategy_for(library),
            }
        }
    }
}

/// Result of the `scrape` pipeline.
#[derive(Debug)]
pub struct ScrapeSummary {
    /// Where the bundle was written.
    pub bundle_path: PathBuf,
    pub total_pages: usize,
    pub total_tokens: usize,
    /// Page counts for every library, including empty ones.
    pub libraries: Vec<LibraryCount>,
    /// Libraries whose pass failed, with the reason.
    pub failed: Vec<(Library, String)>,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each URL of a library pass has been processed.
    fn page_extracted(&self, url: &str, current: usize, total: usize);
    /// Called when one library pass ends, successfully or not.
    fn library_done(&self, library: Library, pages: usize);
    /// Called when the pipeline completes.
    fn done(&self, summary: &ScrapeSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_extracted(&self, _url: &str, _current: usize, _total: usize) {}
    fn library_done(&self, _library: Library, _pages: usize) {}
    fn done(&self, _summary: &ScrapeSummary) {}
}

/// Run the full `scrape` pipeline over every library.
///
/// The generative service credential is resolved before any work starts,
/// so a missing key aborts the run immediately.
#[instrument(skip_all, fields(bundle = %bundle_path.display()))]
pub async fn scrape(
    config: &AppConfig,
    bundle_path: &Path,
    progress: &dyn ProgressReporter,
) -> Result<ScrapeSummary> {
    let generator = Arc::new(GeminiGenerator::from_config(config)?);
    let plan: Vec<(Library, Source)> = Library::ALL
        .into_iter()
        .map(|lib| (lib, Source::for_library(lib)))
        .collect();

    scrape_with(config, generator, &plan, bundle_path, progress).await
}

/// Ingest the libraries in `plan`, in order, and write the bundle.
///
/// Each library pass is isolated: a failure is logged and recorded in the
/// summary, and pages already collected from other libraries are kept.
pub async fn scrape_with<G: TextGenerator + 'static>(
    config: &AppConfig,
    generator: Arc<G>,
    plan: &[(Library, Source)],
    bundle_path: &Path,
    progress: &dyn ProgressReporter,
) -> Result<ScrapeSummary> {
    let start = Instant::now();
    let client = build_client(Duration::from_secs(config.defaults.timeout_secs))?;
    let extractor = ContentExtractor::new(
        client.clone(),
        generator,
        ExtractOptions::from(&config.extraction),
    );

    let mut all_pages: Vec<Page> = Vec::new();
    let mut failed = Vec::new();

    for (library, source) in plan {
        let library = *library;
        progress.phase(&format!("Processing {library}"));
        info!(%library, "library pass starting");

        match run_library(config, &client, &extractor, library, source, progress).await {
            Ok(pages) => {
                info!(%library, pages = pages.len(), "library pass complete");
                progress.library_done(library, pages.len());
                all_pages.extend(pages);
            }
            Err(e) => {
                error!(%library, error = %e, "library pass failed, continuing");
                progress.library_done(library, 0);
                failed.push((library, e.to_string()));
            }
        }
    }

    progress.phase("Building index");
    let bundle = Bundle::build(all_pages);
    bundle.save(bundle_path)?;

    for count in &bundle.metadata.libraries {
        info!(library = %count.name, pages = count.pages, "bundle totals");
    }

    let summary = ScrapeSummary {
        bundle_path: bundle_path.to_path_buf(),
        total_pages: bundle.metadata.total_pages,
        total_tokens: bundle.metadata.total_tokens,
        libraries: bundle.metadata.libraries.clone(),
        failed,
        elapsed: start.elapsed(),
    };

    info!(
        pages = summary.total_pages,
        tokens = summary.total_tokens,
        failed = summary.failed.len(),
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "scrape complete"
    );
    progress.done(&summary);
    Ok(summary)
}

async fn run_library<G: TextGenerator + 'static>(
    config: &AppConfig,
    client: &Client,
    extractor: &ContentExtractor<G>,
    library: Library,
    source: &Source,
    progress: &dyn ProgressReporter,
) -> Result<Vec<Page>> {
    match source {
        Source::SourceTree => extract_wpilib(&config.sources).await,
        Source::Hosted { base_url, strategy } => {
            let opts = DiscoveryOptions::from(config);
            let urls = discover_at(client, library, base_url, *strategy, &opts).await?;
            info!(%library, urls = urls.len(), "extracting content");
            Ok(extractor.extract(&urls, library, progress).await)
        }
    }
}
