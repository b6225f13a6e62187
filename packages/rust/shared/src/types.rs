//! Core domain types for the frc-docs bundle.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title sentinel used when no better title can be derived.
pub const UNTITLED: &str = "Untitled";

// ---------------------------------------------------------------------------
// Library
// ---------------------------------------------------------------------------

/// The fixed set of documentation sources indexed into the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Library {
    #[serde(rename = "WPILib")]
    WpiLib,
    #[serde(rename = "CTRE Phoenix 6")]
    CtrePhoenix6,
    #[serde(rename = "AdvantageKit")]
    AdvantageKit,
    #[serde(rename = "REV Robotics")]
    RevRobotics,
    #[serde(rename = "Limelight")]
    Limelight,
}

impl Library {
    /// Every library, in ingestion order.
    pub const ALL: [Library; 5] = [
        Library::WpiLib,
        Library::CtrePhoenix6,
        Library::AdvantageKit,
        Library::RevRobotics,
        Library::Limelight,
    ];

    /// Display name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WpiLib => "WPILib",
            Self::CtrePhoenix6 => "CTRE Phoenix 6",
            Self::AdvantageKit => "AdvantageKit",
            Self::RevRobotics => "REV Robotics",
            Self::Limelight => "Limelight",
        }
    }

    /// Root URL of the hosted documentation (no trailing slash).
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::WpiLib => "https://docs.wpilib.org/en/stable",
            Self::CtrePhoenix6 => "https://v6.docs.ctr-electronics.com/en/stable",
            Self::AdvantageKit => "https://docs.advantagekit.org",
            Self::RevRobotics => "https://docs.revrobotics.com",
            Self::Limelight => "https://docs.limelightvision.io",
        }
    }

    /// Whether this library is ingested from its source tree instead of its website.
    pub fn from_source_tree(&self) -> bool {
        matches!(self, Self::WpiLib)
    }
}

impl std::fmt::Display for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Library {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lib| lib.as_str() == s)
            .ok_or_else(|| format!("unknown library: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// One normalized unit of documentation content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Stable identifier derived from the source URL or file path.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Owning documentation source.
    pub library: Library,
    /// Canonical URL of the hosted page.
    pub url: String,
    /// Markdown body.
    pub content: String,
    /// Approximate token count of `content`.
    pub tokens: usize,
}

impl Page {
    /// Build a page, computing its token estimate from `content`.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        library: Library,
        url: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        Self {
            id: id.into(),
            title: title.into(),
            library,
            url: url.into(),
            tokens: estimate_tokens(&content),
            content,
        }
    }

    /// Replace the body and recompute the token estimate.
    pub fn set_content(&mut self, content: String) {
        self.tokens = estimate_tokens(&content);
        self.content = content;
    }
}

/// Approximate token count: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Collapse every run of non-alphanumeric characters to `_` and trim the ends.
pub fn derive_id(raw: &str) -> String {
    let mut id = String::with_capacity(raw.len());
    let mut pending_sep = false;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !id.is_empty() {
                id.push('_');
            }
            pending_sep = false;
            id.push(c);
        } else {
            pending_sep = true;
        }
    }

    id
}

/// Derive a page id from its URL (scheme stripped).
pub fn page_id_from_url(url: &str) -> String {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    derive_id(without_scheme)
}

// ---------------------------------------------------------------------------
// SearchResult
// ---------------------------------------------------------------------------

/// A ranked hit returned by the query engine. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    /// Excerpt of the stored content around the query match.
    pub snippet: String,
    pub url: String,
    pub library: Library,
    /// Raw relevance score from the index.
    pub score: f64,
}

// ---------------------------------------------------------------------------
// BundleMetadata
// ---------------------------------------------------------------------------

/// Page count for one library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryCount {
    pub name: Library,
    pub pages: usize,
}

/// Aggregate statistics stored alongside the bundle's pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleMetadata {
    pub generated_at: DateTime<Utc>,
    pub total_pages: usize,
    pub total_tokens: usize,
    pub libraries: Vec<LibraryCount>,
}

impl BundleMetadata {
    /// Compute metadata for `pages`, timestamped now.
    ///
    /// Every library in [`Library::ALL`] is listed, so the counts partition
    /// `pages` exactly even when a library contributed nothing.
    pub fn from_pages(pages: &[Page]) -> Self {
        let mut counts: BTreeMap<Library, usize> =
            Library::ALL.into_iter().map(|lib| (lib, 0)).collect();
        for page in pages {
            *counts.entry(page.library).or_default() += 1;
        }

        Self {
            generated_at: Utc::now(),
            total_pages: pages.len(),
            total_tokens: pages.iter().map(|p| p.tokens).sum(),
            libraries: Library::ALL
                .into_iter()
                .map(|lib| LibraryCount {
                    name: lib,
                    pages: counts.get(&lib).copied().unwrap_or(0),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: &str, library: Library, content: &str) -> Page {
        Page::new(id, id, library, format!("https://example.com/{id}"), content)
    }

    #[test]
    fn library_serializes_to_display_name() {
        let json = serde_json::to_string(&Library::CtrePhoenix6).expect("serialize");
        assert_eq!(json, r#""CTRE Phoenix 6""#);

        let parsed: Library = serde_json::from_str(r#""REV Robotics""#).expect("deserialize");
        assert_eq!(parsed, Library::RevRobotics);
    }

    #[test]
    fn library_from_str_roundtrip() {
        for lib in Library::ALL {
            let parsed: Library = lib.as_str().parse().expect("parse library");
            assert_eq!(parsed, lib);
        }
        assert!("FTC SDK".parse::<Library>().is_err());
    }

    #[test]
    fn token_estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn page_id_from_url_strips_scheme_and_collapses() {
        assert_eq!(
            page_id_from_url("https://docs.advantagekit.org/getting-started/what-is-advantagekit/"),
            "docs_advantagekit_org_getting_started_what_is_advantagekit"
        );
        assert_eq!(
            page_id_from_url("http://v6.docs.ctr-electronics.com/en/stable/index.html"),
            "v6_docs_ctr_electronics_com_en_stable_index_html"
        );
    }

    #[test]
    fn derive_id_trims_separators() {
        assert_eq!(derive_id("__a//b--c__"), "a_b_c");
        assert_eq!(derive_id("///"), "");
    }

    #[test]
    fn set_content_recomputes_tokens() {
        let mut p = page("a", Library::WpiLib, "12345678");
        assert_eq!(p.tokens, 2);
        p.set_content("1".repeat(40));
        assert_eq!(p.tokens, 10);
    }

    #[test]
    fn metadata_partitions_pages_by_library() {
        let pages = vec![
            page("a", Library::WpiLib, "aaaa"),
            page("b", Library::WpiLib, "bbbbbbbb"),
            page("c", Library::Limelight, "c"),
        ];
        let meta = BundleMetadata::from_pages(&pages);

        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.total_tokens, 1 + 2 + 1);
        assert_eq!(meta.libraries.len(), Library::ALL.len());
        let sum: usize = meta.libraries.iter().map(|l| l.pages).sum();
        assert_eq!(sum, pages.len());

        let wpilib = meta
            .libraries
            .iter()
            .find(|l| l.name == Library::WpiLib)
            .expect("wpilib entry");
        assert_eq!(wpilib.pages, 2);
    }

    #[test]
    fn metadata_serializes_camel_case() {
        let meta = BundleMetadata::from_pages(&[]);
        let json = serde_json::to_string(&meta).expect("serialize");
        assert!(json.contains("generatedAt"));
        assert!(json.contains("totalPages"));
        assert!(json.contains("totalTokens"));
    }
}
