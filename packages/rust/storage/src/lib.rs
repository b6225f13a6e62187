//! Bundle persistence.
//!
//! The [`Bundle`] is the single artifact produced by ingestion: every page,
//! the serialized search index and aggregate metadata, written as one JSON
//! file. [`DocsBundle`] is its read-side form, keyed by page id for serving.
//!
//! **Access rules:**
//! - `frc-docs scrape` / `postprocess`: sole writer via [`Bundle::save`]
//! - `frc-docs serve`: read-only via [`DocsBundle::load`]

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use frcdocs_index::SearchIndex;
use frcdocs_shared::{BundleMetadata, FrcDocsError, Page, Result};

/// Hint appended to every load failure.
const SCRAPE_HINT: &str = "run `frc-docs scrape` first";

// ---------------------------------------------------------------------------
// Bundle (write side)
// ---------------------------------------------------------------------------

/// The persisted artifact: pages, search index and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    pub pages: Vec<Page>,
    pub index: SearchIndex,
    pub metadata: BundleMetadata,
}

impl Bundle {
    /// Index `pages` and compute their metadata.
    pub fn build(pages: Vec<Page>) -> Self {
        let index = SearchIndex::build(&pages);
        let metadata = BundleMetadata::from_pages(&pages);
        Self {
            pages,
            index,
            metadata,
        }
    }

    /// Read a bundle from `path` without building the id map.
    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            FrcDocsError::persistence(path, format!("cannot read bundle ({e}); {SCRAPE_HINT}"))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            FrcDocsError::persistence(path, format!("corrupt bundle ({e}); {SCRAPE_HINT}"))
        })
    }

    /// Write the bundle to `path`, replacing any previous file atomically.
    #[instrument(skip_all, fields(path = %path.display(), pages = self.pages.len()))]
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| FrcDocsError::io(parent, e))?;
            }
        }

        let json = serde_json::to_string(self)
            .map_err(|e| FrcDocsError::persistence(path, format!("serialize bundle: {e}")))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bundle.json".to_string());
        let temp = path.with_file_name(format!(".{file_name}.tmp"));

        std::fs::write(&temp, &json).map_err(|e| FrcDocsError::io(&temp, e))?;
        std::fs::rename(&temp, path).map_err(|e| FrcDocsError::io(path, e))?;

        info!(
            bytes = json.len(),
            total_tokens = self.metadata.total_tokens,
            "bundle written"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DocsBundle (read side)
// ---------------------------------------------------------------------------

/// A loaded bundle ready for queries. Never mutated after construction.
#[derive(Debug)]
pub struct DocsBundle {
    pages: HashMap<String, Page>,
    index: SearchIndex,
    metadata: BundleMetadata,
}

impl DocsBundle {
    /// Load and rehydrate the bundle at `path`.
    ///
    /// A missing or unparseable file is a persistence error telling the
    /// user to run ingestion first.
    pub fn load(path: &Path) -> Result<Self> {
        let bundle = Bundle::read(path)?;
        let loaded = Self::from(bundle);
        info!(
            path = %path.display(),
            pages = loaded.pages.len(),
            "bundle loaded"
        );
        Ok(loaded)
    }

    /// Page with the given id.
    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.get(id)
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn metadata(&self) -> &BundleMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl From<Bundle> for DocsBundle {
    fn from(bundle: Bundle) -> Self {
        let mut pages = HashMap::with_capacity(bundle.pages.len());
        for page in bundle.pages {
            if let Some(previous) = pages.insert(page.id.clone(), page) {
                warn!(id = %previous.id, "duplicate page id; keeping the later page");
            }
        }
        debug!(unique = pages.len(), "id map built");

        Self {
            pages,
            index: bundle.index,
            metadata: bundle.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frcdocs_index::SearchOptions;
    use frcdocs_shared::Library;
    use uuid::Uuid;

    fn sample_pages() -> Vec<Page> {
        vec![
            Page::new(
                "wpilib_docs_pid",
                "PID Control in WPILib",
                Library::WpiLib,
                "https://docs.wpilib.org/en/stable/docs/pid.html",
                "Use the PIDController class.",
            ),
            Page::new(
                "docs_limelightvision_io_docs_aiming",
                "Aiming",
                Library::Limelight,
                "https://docs.limelightvision.io/docs/aiming",
                "Read tx from NetworkTables.",
            ),
        ]
    }

    fn temp_bundle_path() -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("frcdocs-storage-{}", Uuid::now_v7()))
            .join("data")
            .join("docs.json")
    }

    #[test]
    fn build_computes_consistent_metadata() {
        let bundle = Bundle::build(sample_pages());
        assert_eq!(bundle.metadata.total_pages, bundle.pages.len());
        assert_eq!(
            bundle.metadata.total_tokens,
            bundle.pages.iter().map(|p| p.tokens).sum::<usize>()
        );
        assert_eq!(bundle.index.len(), 2);
    }

    #[test]
    fn save_then_load_serves_pages_and_index() {
        let path = temp_bundle_path();
        Bundle::build(sample_pages()).save(&path).expect("save bundle");
        assert!(path.exists());
        assert!(!path.with_file_name(".docs.json.tmp").exists());

        let loaded = DocsBundle::load(&path).expect("load bundle");
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded.page("wpilib_docs_pid").map(|p| p.title.as_str()),
            Some("PID Control in WPILib")
        );
        assert!(loaded.page("nonexistent_id").is_none());

        let hits = loaded.index().search("PIDController", &SearchOptions::default());
        assert_eq!(hits[0].doc.id, "wpilib_docs_pid");

        if let Some(root) = path.parent().and_then(Path::parent) {
            let _ = std::fs::remove_dir_all(root);
        }
    }

    #[test]
    fn save_overwrites_previous_bundle() {
        let path = temp_bundle_path();
        Bundle::build(sample_pages()).save(&path).expect("first save");
        Bundle::build(Vec::new()).save(&path).expect("second save");

        let loaded = DocsBundle::load(&path).expect("load bundle");
        assert!(loaded.is_empty());
        assert_eq!(loaded.metadata().total_pages, 0);

        if let Some(root) = path.parent().and_then(Path::parent) {
            let _ = std::fs::remove_dir_all(root);
        }
    }

    #[test]
    fn missing_bundle_tells_user_to_scrape() {
        let err = DocsBundle::load(&temp_bundle_path()).expect_err("missing file");
        assert!(matches!(err, FrcDocsError::Persistence { .. }));
        assert!(err.to_string().contains("frc-docs scrape"));
    }

    #[test]
    fn corrupt_bundle_is_persistence_error() {
        let path = temp_bundle_path();
        let parent = path.parent().expect("parent");
        std::fs::create_dir_all(parent).expect("mkdir");
        std::fs::write(&path, "{\"pages\": [").expect("write");

        let err = DocsBundle::load(&path).expect_err("corrupt file");
        assert!(err.to_string().contains("corrupt bundle"));

        if let Some(root) = parent.parent() {
            let _ = std::fs::remove_dir_all(root);
        }
    }

    #[test]
    fn duplicate_ids_keep_last_page() {
        let mut pages = sample_pages();
        let mut dup = pages[0].clone();
        dup.title = "Replacement".into();
        pages.push(dup);

        let loaded = DocsBundle::from(Bundle::build(pages));
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded.page("wpilib_docs_pid").map(|p| p.title.as_str()),
            Some("Replacement")
        );
    }
}
