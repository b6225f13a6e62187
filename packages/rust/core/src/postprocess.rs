//! Bundle repair pass: fixes quality problems in an existing bundle
//! without re-scraping.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument};

use frcdocs_markdown::extract_title;
use frcdocs_shared::{Library, Page, Result, UNTITLED};
use frcdocs_storage::Bundle;

/// Title of the search-only placeholder page some sites publish.
const SEARCH_PLACEHOLDER_TITLE: &str = "Search the documentation";
/// Pages with a `<form` tag and fewer tokens than this are failed conversions.
const FORM_JUNK_MAX_TOKENS: usize = 200;
/// Source-tree pages at or under this many tokens may be toctree stubs.
const STUB_MAX_TOKENS: usize = 60;

static ORPHAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:orphan:\s*\n*").expect("orphan regex"));
static NOT_FOUND_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)page not found").expect("not-found title regex"));
static NOT_FOUND_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^#\s+page not found").expect("not-found heading regex"));
static PATH_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w/-]+$").expect("path line regex"));

/// Counts from one repair pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub original_pages: usize,
    pub fixed_titles: usize,
    pub removed_junk: usize,
    pub removed_stubs: usize,
    pub cleaned_orphan: usize,
    pub still_untitled: usize,
    pub final_pages: usize,
}

/// Apply the cleanup rules to `pages`, in order, and return the survivors.
///
/// Token counts of every surviving page are recomputed.
pub fn repair_pages(pages: Vec<Page>) -> (Vec<Page>, RepairReport) {
    let mut report = RepairReport {
        original_pages: pages.len(),
        ..RepairReport::default()
    };
    let mut kept = Vec::with_capacity(pages.len());

    for mut page in pages {
        if page.library == Library::WpiLib && page.content.starts_with(":orphan:") {
            let cleaned = ORPHAN_RE.replace(&page.content, "").trim().to_string();
            page.set_content(cleaned);
            report.cleaned_orphan += 1;
        }

        if is_junk(&page) {
            debug!(title = %page.title, library = %page.library, "removing junk page");
            report.removed_junk += 1;
            continue;
        }

        if is_toctree_stub(&page) {
            debug!(title = %page.title, library = %page.library, "removing toctree stub");
            report.removed_stubs += 1;
            continue;
        }

        if page.title == UNTITLED {
            let title = extract_title(&page.content, Some(&page.url));
            if title != UNTITLED {
                page.title = title;
                report.fixed_titles += 1;
            }
        }

        let content = std::mem::take(&mut page.content);
        page.set_content(content);
        kept.push(page);
    }

    report.still_untitled = kept.iter().filter(|p| p.title == UNTITLED).count();
    report.final_pages = kept.len();
    (kept, report)
}

/// Repair the bundle at `path` in place, rebuilding its index and metadata.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn postprocess(path: &Path) -> Result<RepairReport> {
    let bundle = Bundle::read(path)?;
    let (pages, report) = repair_pages(bundle.pages);

    for page in pages.iter().filter(|p| p.title == UNTITLED).take(5) {
        debug!(url = %page.url, tokens = page.tokens, "still untitled");
    }

    let rebuilt = Bundle::build(pages);
    rebuilt.save(path)?;

    info!(
        original = report.original_pages,
        fixed_titles = report.fixed_titles,
        removed_junk = report.removed_junk,
        removed_stubs = report.removed_stubs,
        cleaned_orphan = report.cleaned_orphan,
        still_untitled = report.still_untitled,
        final_pages = report.final_pages,
        total_tokens = rebuilt.metadata.total_tokens,
        "postprocess complete"
    );
    Ok(report)
}

/// Not-found pages, search placeholders, and raw-HTML conversions.
fn is_junk(page: &Page) -> bool {
    NOT_FOUND_TITLE_RE.is_match(&page.title)
        || NOT_FOUND_HEADING_RE.is_match(&page.content)
        || page.title == SEARCH_PLACEHOLDER_TITLE
        || (page.content.contains("<form") && page.tokens < FORM_JUNK_MAX_TOKENS)
}

/// A short source-tree page that is mostly bare document paths.
fn is_toctree_stub(page: &Page) -> bool {
    if page.library != Library::WpiLib || page.tokens > STUB_MAX_TOKENS {
        return false;
    }
    let lines: Vec<&str> = page
        .content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let path_lines = lines.iter().filter(|l| PATH_LINE_RE.is_match(l)).count();
    path_lines * 2 > lines.len()
}
