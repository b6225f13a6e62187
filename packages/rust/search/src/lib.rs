//! Query engine over a loaded bundle: ranked search with snippets, and
//! direct page lookup.

use tracing::debug;

use frcdocs_index::SearchOptions;
use frcdocs_shared::{Library, Page, SearchResult, UNTITLED};
use frcdocs_storage::DocsBundle;

/// Result count used when the caller gives none.
pub const DEFAULT_LIMIT: usize = 10;

const SNIPPET_BEFORE: usize = 80;
const SNIPPET_AFTER: usize = 120;
const SNIPPET_FALLBACK: usize = 200;
const ELLIPSIS: &str = "...";

/// Rank pages against `query`, optionally restricted to one library.
///
/// The library filter runs after ranking and never reorders; `limit` is
/// applied after filtering.
pub fn search(
    bundle: &DocsBundle,
    query: &str,
    library: Option<Library>,
    limit: usize,
) -> Vec<SearchResult> {
    let hits = bundle.index().search(query, &SearchOptions::default());
    let total = hits.len();

    let results: Vec<SearchResult> = hits
        .into_iter()
        .filter(|hit| library.is_none_or(|lib| hit.doc.library == lib))
        .take(limit)
        .map(|hit| {
            let snippet = bundle
                .page(&hit.doc.id)
                .map(|page| snippet(&page.content, query))
                .unwrap_or_default();
            let title = if hit.doc.title.is_empty() {
                UNTITLED.to_string()
            } else {
                hit.doc.title.clone()
            };

            SearchResult {
                id: hit.doc.id.clone(),
                title,
                snippet,
                url: hit.doc.url.clone(),
                library: hit.doc.library,
                score: hit.score,
            }
        })
        .collect();

    debug!(
        query,
        library = library.map(|l| l.as_str()),
        matched = total,
        returned = results.len(),
        "search"
    );
    results
}

/// Page with exactly this id, if any.
pub fn read<'a>(bundle: &'a DocsBundle, id: &str) -> Option<&'a Page> {
    bundle.page(id)
}

/// Excerpt of `content` around the first case-insensitive occurrence of
/// `query`, or its opening characters when the query text does not occur
/// literally.
pub fn snippet(content: &str, query: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let haystack = fold_case(content);
    let needle = fold_case(query);

    match find_chars(&haystack, &needle) {
        Some(idx) => {
            let start = idx.saturating_sub(SNIPPET_BEFORE);
            let end = (idx + needle.len() + SNIPPET_AFTER).min(chars.len());
            let excerpt: String = chars[start..end].iter().collect();

            let mut out = String::new();
            if start > 0 {
                out.push_str(ELLIPSIS);
            }
            out.push_str(excerpt.trim());
            if end < chars.len() {
                out.push_str(ELLIPSIS);
            }
            out
        }
        None => {
            let head: String = chars.iter().take(SNIPPET_FALLBACK).collect();
            format!("{}{ELLIPSIS}", head.trim())
        }
    }
}

/// Lowercase one char at a time so indices stay aligned with the original.
fn fold_case(text: &str) -> Vec<char> {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use frcdocs_storage::Bundle;

    fn bundle() -> DocsBundle {
        let pages = vec![
            Page::new(
                "pid_basics",
                "PIDController Basics",
                Library::WpiLib,
                "https://docs.wpilib.org/pid",
                "Closed-loop control in WPILib starts with the PIDController class. \
                 Construct it with kP, kI and kD gains and call calculate() every loop.",
            ),
            Page::new(
                "profiled_pid",
                "Profiled PID",
                Library::WpiLib,
                "https://docs.wpilib.org/profiled",
                "ProfiledPIDController adds motion profiling on top of PID control.",
            ),
            Page::new(
                "rev_closed_loop",
                "Closed Loop Control",
                Library::RevRobotics,
                "https://docs.revrobotics.com/closed-loop",
                "The SPARK MAX runs a PID loop on the controller itself.",
            ),
            Page::new(
                "ll_aiming",
                "Aiming and Ranging",
                Library::Limelight,
                "https://docs.limelightvision.io/aiming",
                "Feed tx into a P loop to turn toward the target.",
            ),
        ];
        DocsBundle::from(Bundle::build(pages))
    }

    #[test]
    fn exact_term_ranks_titled_page_first_with_snippet() {
        let bundle = bundle();
        let results = search(&bundle, "PIDController", None, DEFAULT_LIMIT);

        assert_eq!(results[0].id, "pid_basics");
        assert!(results[0].snippet.contains("PIDController"));
        assert!(results[0].score > 0.0);
    }

    #[test]
    fn one_edit_typo_still_matches() {
        let bundle = bundle();
        let results = search(&bundle, "pidcontroler", None, DEFAULT_LIMIT);
        assert!(results.iter().any(|r| r.id == "pid_basics"));
    }

    #[test]
    fn library_filter_excludes_better_matches_elsewhere() {
        let bundle = bundle();
        let unfiltered = search(&bundle, "PID", None, DEFAULT_LIMIT);
        assert_ne!(unfiltered[0].library, Library::RevRobotics);

        let results = search(&bundle, "PID", Some(Library::RevRobotics), DEFAULT_LIMIT);
        assert_eq!(results.len(), 1);
        assert!(results.iter().all(|r| r.library == Library::RevRobotics));
    }

    #[test]
    fn limit_caps_result_count() {
        let bundle = bundle();
        assert!(search(&bundle, "PID", None, DEFAULT_LIMIT).len() > 1);
        assert_eq!(search(&bundle, "PID", None, 1).len(), 1);
    }

    #[test]
    fn unknown_query_returns_nothing() {
        let bundle = bundle();
        assert!(search(&bundle, "swervemodulestate", None, DEFAULT_LIMIT).is_empty());
    }

    #[test]
    fn read_is_exact_lookup() {
        let bundle = bundle();
        assert_eq!(
            read(&bundle, "ll_aiming").map(|p| p.library),
            Some(Library::Limelight)
        );
        assert!(read(&bundle, "nonexistent_id").is_none());
    }

    #[test]
    fn snippet_windows_around_match() {
        let content = format!("{}needle{}", "a".repeat(100), "b".repeat(200));
        let s = snippet(&content, "NEEDLE");

        assert!(s.starts_with("..."));
        assert!(s.ends_with("..."));
        assert!(s.contains("needle"));
        assert_eq!(s.chars().count(), 3 + 80 + 6 + 120 + 3);
    }

    #[test]
    fn snippet_unclipped_when_match_near_start() {
        assert_eq!(snippet("Use the PIDController.", "pidcontroller"), "Use the PIDController.");
    }

    #[test]
    fn snippet_falls_back_to_head() {
        let content = "x".repeat(300);
        let s = snippet(&content, "missing");
        assert_eq!(s, format!("{}...", "x".repeat(200)));
    }

    #[test]
    fn snippet_is_char_safe() {
        let content = format!("{}Überblick über PID", "é".repeat(90));
        let s = snippet(&content, "über pid");
        assert!(s.starts_with("..."));
        assert!(s.contains("über PID"));
    }
}
