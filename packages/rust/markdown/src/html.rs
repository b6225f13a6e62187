//! HTML boilerplate stripping ahead of model-assisted conversion.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

/// Whole-element removals: the tag and everything inside it.
static CHROME_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["script", "style", "nav", "footer", "header"]
        .into_iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).expect("chrome regex")
        })
        .collect()
});

/// Content containers, in priority order.
const CONTENT_SELECTORS: &[&str] = &["main", "article", "[role=\"main\"]"];

/// Remove page chrome and narrow to the main content container.
///
/// `<script>`, `<style>`, `<nav>`, `<footer>` and `<header>` blocks are
/// dropped first. If a `<main>`, `<article>` or `role="main"` element
/// exists, only that element is kept. The result is capped at
/// `max_chars` characters.
pub fn strip_boilerplate(html: &str, max_chars: usize) -> String {
    let mut cleaned = html.to_string();
    for re in CHROME_RES.iter() {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }

    let content = select_content(&cleaned).unwrap_or(cleaned);
    truncate_chars(&content, max_chars).to_string()
}

/// Outer HTML of the first content container, if any.
fn select_content(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);

    CONTENT_SELECTORS.iter().find_map(|sel_str| {
        let selector = Selector::parse(sel_str).ok()?;
        doc.select(&selector).next().map(|el| el.html())
    })
}

/// Longest prefix of `s` with at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_chrome_blocks() {
        let html = r#"<html><head><style>body { color: red; }</style>
            <script src="a.js"></script><script>track();</script></head>
            <body><header><h1>Site</h1></header><nav><a href="/">Home</a></nav>
            <div><p>Real content lives here.</p></div>
            <footer>Copyright 2025</footer></body></html>"#;

        let out = strip_boilerplate(html, 100_000);
        assert!(out.contains("Real content lives here."));
        assert!(!out.contains("track()"));
        assert!(!out.contains("color: red"));
        assert!(!out.contains("Home"));
        assert!(!out.contains("Copyright"));
        assert!(!out.contains("<h1>Site</h1>"));
    }

    #[test]
    fn prefers_main_container() {
        let html = r#"<html><body><div class="sidebar">Sidebar links</div>
            <main id="content"><h1>Motor Controllers</h1><p>Body.</p></main></body></html>"#;

        let out = strip_boilerplate(html, 100_000);
        assert!(out.starts_with("<main"));
        assert!(out.contains("Motor Controllers"));
        assert!(!out.contains("Sidebar links"));
    }

    #[test]
    fn falls_back_to_role_main() {
        let html = r#"<html><body><div>Skip me</div>
            <div role="main"><p>Limelight pipeline setup.</p></div></body></html>"#;

        let out = strip_boilerplate(html, 100_000);
        assert!(out.contains("Limelight pipeline setup."));
        assert!(!out.contains("Skip me"));
    }

    #[test]
    fn fixture_page_is_narrowed() {
        let html = std::fs::read_to_string("../../../fixtures/html/advantagekit-page.html")
            .expect("read html fixture");
        let out = strip_boilerplate(&html, 100_000);
        assert!(out.contains("Installing AdvantageKit"));
        assert!(!out.contains("gtag("));
        assert!(!out.contains("Edit this page"));
    }

    #[test]
    fn truncation_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        let out = strip_boilerplate(&"ü".repeat(50), 10);
        assert_eq!(out.chars().count(), 10);
    }
}
