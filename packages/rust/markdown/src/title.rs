//! Page title derivation from converted markdown.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use frcdocs_shared::UNTITLED;

static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").expect("h1 regex"));

static H2_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^##[ \t]+(.+)$").expect("h2 regex"));

static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\*\*(.+?)\*\*").expect("bold regex"));

/// Derive a display title.
///
/// Tries, in order: the first `#` heading, the first `##` heading, bold text
/// opening a line, a humanized slug of the URL's last path segment, and
/// finally [`UNTITLED`].
pub fn extract_title(markdown: &str, url: Option<&str>) -> String {
    for re in [&*H1_RE, &*H2_RE, &*BOLD_RE] {
        if let Some(caps) = re.captures(markdown) {
            let title = caps[1].trim();
            if !title.is_empty() {
                return title.to_string();
            }
        }
    }

    url.and_then(humanize_slug)
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// `getting-started_guide.html` at the end of a URL path becomes
/// `Getting Started Guide`.
pub fn humanize_slug(url: &str) -> Option<String> {
    let slug = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string),
        Err(_) => url.split('/').filter(|s| !s.is_empty()).last().map(str::to_string),
    }?;

    let stem = slug
        .strip_suffix(".html")
        .or_else(|| slug.strip_suffix(".htm"))
        .unwrap_or(&slug);

    let words: Vec<String> = stem
        .split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
