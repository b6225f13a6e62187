//! Source-tree extraction for the WPILib documentation.
//!
//! The reStructuredText sources are shallow-cloned and normalized locally,
//! so this path needs neither page fetches nor the generative service.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use frcdocs_markdown::normalize;
use frcdocs_shared::{FrcDocsError, Library, Page, Result, SourcesConfig, UNTITLED, derive_id};

/// Files with less raw text than this are stubs.
const MIN_SOURCE_CHARS: usize = 100;
/// Normalized output shorter than this carries no real content.
const MIN_NORMALIZED_CHARS: usize = 50;
/// Namespace prefix for source-tree page ids.
const ID_PREFIX: &str = "wpilib_";

static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").expect("h1 regex"));

/// Clone the WPILib docs repository and convert every `.rst` file under
/// `source/`. The clone directory is removed before and after.
#[instrument(skip_all, fields(repo = %config.wpilib_repo))]
pub async fn extract_wpilib(config: &SourcesConfig) -> Result<Vec<Page>> {
    let repo = config.wpilib_repo.clone();
    let clone_dir = config.clone_dir();

    tokio::task::spawn_blocking(move || {
        remove_clone(&clone_dir);
        let result = clone_repo(&repo, &clone_dir).and_then(|()| {
            extract_source_tree(&clone_dir.join("source"), Library::WpiLib.base_url())
        });
        remove_clone(&clone_dir);
        result
    })
    .await
    .map_err(|e| FrcDocsError::discovery(Library::WpiLib, format!("source task failed: {e}")))?
}

/// `git clone --depth 1 <repo> <dest>`.
pub fn clone_repo(repo: &str, dest: &Path) -> Result<()> {
    info!(%repo, dest = %dest.display(), "cloning (shallow)");
    let output = Command::new("git")
        .args(["clone", "--depth", "1", "--quiet", repo])
        .arg(dest)
        .output()
        .map_err(|e| FrcDocsError::io(dest, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FrcDocsError::Network(format!(
            "git clone of {repo} failed: {}",
            stderr.trim()
        )));
    }
    Ok(())
}

/// Convert every `.rst` file below `source_dir` into a page.
///
/// Files are visited in path order. Stubs and files that normalize to
/// almost nothing are skipped; unreadable files are logged and skipped.
pub fn extract_source_tree(source_dir: &Path, base_url: &str) -> Result<Vec<Page>> {
    if !source_dir.is_dir() {
        return Err(FrcDocsError::discovery(
            Library::WpiLib,
            format!("source directory not found: {}", source_dir.display()),
        ));
    }

    let mut pages = Vec::new();
    let mut skipped = 0usize;

    let files = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!(error = %err, "walk error");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rst"));

    for entry in files {
        let path = entry.path();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable source file");
                skipped += 1;
                continue;
            }
        };

        match source_page(source_dir, path, &raw, base_url) {
            Some(page) => pages.push(page),
            None => skipped += 1,
        }
    }

    info!(pages = pages.len(), skipped, "source tree extracted");
    Ok(pages)
}

/// Build the page for one source file, or `None` if it is too thin.
fn source_page(source_dir: &Path, path: &Path, raw: &str, base_url: &str) -> Option<Page> {
    if raw.trim().chars().count() < MIN_SOURCE_CHARS {
        debug!(path = %path.display(), "stub source file");
        return None;
    }

    let markdown = normalize(raw);
    if markdown.trim().chars().count() < MIN_NORMALIZED_CHARS {
        debug!(path = %path.display(), "normalized to almost nothing");
        return None;
    }

    let rel_html = html_rel_path(source_dir, path)?;
    let url = format!("{}/{rel_html}", base_url.trim_end_matches('/'));
    let id = format!("{ID_PREFIX}{}", derive_id(&rel_html));
    let title = source_title(&markdown, &rel_html);

    Some(Page::new(id, title, Library::WpiLib, url, markdown))
}

/// Path relative to `source_dir`, `/`-separated, with `.rst` replaced by `.html`.
fn html_rel_path(source_dir: &Path, path: &Path) -> Option<String> {
    let rel: PathBuf = path.strip_prefix(source_dir).ok()?.with_extension("html");
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// First `# ` heading, else the file stem, else [`UNTITLED`].
fn source_title(markdown: &str, rel_html: &str) -> String {
    if let Some(caps) = H1_RE.captures(markdown) {
        return caps[1].trim().to_string();
    }
    rel_html
        .rsplit('/')
        .next()
        .map(|name| name.trim_end_matches(".html"))
        .filter(|stem| !stem.is_empty())
        .map_or_else(|| UNTITLED.to_string(), str::to_string)
}

fn remove_clone(dir: &Path) {
    if dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(dir) {
            warn!(dir = %dir.display(), error = %e, "failed to remove clone directory");
        }
    }
}
