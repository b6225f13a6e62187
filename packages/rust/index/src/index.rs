//! In-memory inverted index with BM25+ scoring.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use frcdocs_shared::{Library, Page};

use crate::expand::expand;
use crate::tokenizer::tokenize;

// BM25+ parameters.
const K1: f64 = 1.2;
const B: f64 = 0.7;
const DELTA: f64 = 0.5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Indexed text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Content,
}

/// Fields stored per document and returned with every hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDoc {
    pub id: String,
    pub title: String,
    pub url: String,
    pub library: Library,
    title_len: u32,
    content_len: u32,
}

impl StoredDoc {
    fn field_len(&self, field: Field) -> u32 {
        match field {
            Field::Title => self.title_len,
            Field::Content => self.content_len,
        }
    }
}

/// One occurrence record: document, field and term frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Posting {
    doc: u32,
    field: Field,
    tf: u32,
}

/// Tuning knobs for a query.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Multiplier for title matches relative to content matches.
    pub title_boost: f64,
    /// Fuzzy tolerance as a fraction of term length (0 disables).
    pub fuzzy: f64,
    /// Whether query terms also match longer index terms they prefix.
    pub prefix: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            title_boost: 3.0,
            fuzzy: 0.2,
            prefix: true,
        }
    }
}

/// A scored match.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    pub doc: &'a StoredDoc,
    pub score: f64,
}

// ---------------------------------------------------------------------------
// SearchIndex
// ---------------------------------------------------------------------------

/// Full-text index over page titles and bodies.
///
/// Serializes to a self-contained JSON value; only this type reads it back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchIndex {
    docs: Vec<StoredDoc>,
    terms: BTreeMap<String, Vec<Posting>>,
    avg_title_len: f64,
    avg_content_len: f64,
}

impl SearchIndex {
    /// Index every page's title and content.
    pub fn build(pages: &[Page]) -> Self {
        let mut index = Self::default();
        let mut title_total: u64 = 0;
        let mut content_total: u64 = 0;

        for (i, page) in pages.iter().enumerate() {
            let doc = i as u32;
            let title_len = index.add_field(doc, Field::Title, &page.title);
            let content_len = index.add_field(doc, Field::Content, &page.content);
            title_total += u64::from(title_len);
            content_total += u64::from(content_len);

            index.docs.push(StoredDoc {
                id: page.id.clone(),
                title: page.title.clone(),
                url: page.url.clone(),
                library: page.library,
                title_len,
                content_len,
            });
        }

        if !pages.is_empty() {
            index.avg_title_len = title_total as f64 / pages.len() as f64;
            index.avg_content_len = content_total as f64 / pages.len() as f64;
        }

        debug!(
            docs = index.docs.len(),
            terms = index.terms.len(),
            "search index built"
        );
        index
    }

    /// Tokenize `text` into postings for `doc`; returns the token count.
    fn add_field(&mut self, doc: u32, field: Field, text: &str) -> u32 {
        let tokens = tokenize(text);
        let mut counts: HashMap<String, u32> = HashMap::new();
        for token in &tokens {
            *counts.entry(token.clone()).or_default() += 1;
        }
        for (term, tf) in counts {
            self.terms
                .entry(term)
                .or_default()
                .push(Posting { doc, field, tf });
        }
        tokens.len() as u32
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Rank documents against `query`, best first.
    ///
    /// A document's score sums, over every query term and every index term
    /// it expands to, the expansion weight times the field boost times the
    /// BM25+ score of that field. Ties keep index order.
    pub fn search(&self, query: &str, opts: &SearchOptions) -> Vec<SearchHit<'_>> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() || self.docs.is_empty() {
            return Vec::new();
        }

        let total_docs = self.docs.len() as f64;
        let mut scores: HashMap<u32, f64> = HashMap::new();

        for query_term in &query_terms {
            for (term, weight) in expand(&self.terms, query_term, opts.fuzzy, opts.prefix) {
                let Some(postings) = self.terms.get(term) else {
                    continue;
                };

                for field in [Field::Title, Field::Content] {
                    let matching = postings.iter().filter(|p| p.field == field).count() as f64;
                    if matching == 0.0 {
                        continue;
                    }
                    let idf = (1.0 + (total_docs - matching + 0.5) / (matching + 0.5)).ln();
                    let boost = match field {
                        Field::Title => opts.title_boost,
                        Field::Content => 1.0,
                    };
                    let avg_len = self.avg_len(field);

                    for posting in postings.iter().filter(|p| p.field == field) {
                        let doc_len = f64::from(self.docs[posting.doc as usize].field_len(field));
                        let score = weight
                            * boost
                            * bm25_plus(f64::from(posting.tf), doc_len, avg_len, idf);
                        *scores.entry(posting.doc).or_default() += score;
                    }
                }
            }
        }

        let mut ranked: Vec<(u32, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        ranked
            .into_iter()
            .map(|(doc, score)| SearchHit {
                doc: &self.docs[doc as usize],
                score,
            })
            .collect()
    }

    fn avg_len(&self, field: Field) -> f64 {
        let avg = match field {
            Field::Title => self.avg_title_len,
            Field::Content => self.avg_content_len,
        };
        if avg > 0.0 { avg } else { 1.0 }
    }
}

fn bm25_plus(tf: f64, doc_len: f64, avg_len: f64, idf: f64) -> f64 {
    idf * (DELTA + tf * (K1 + 1.0) / (tf + K1 * (1.0 - B + B * doc_len / avg_len)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: &str, title: &str, library: Library, content: &str) -> Page {
        Page::new(id, title, library, format!("https://docs.example.com/{id}"), content)
    }

    fn corpus() -> Vec<Page> {
        vec![
            page(
                "pid_basics",
                "PIDController Basics",
                Library::WpiLib,
                "Use the PIDController class to close the loop on a mechanism.",
            ),
            page(
                "arm_tuning",
                "Tuning an Arm",
                Library::WpiLib,
                "Feedforward first, then add a small proportional gain.",
            ),
            page(
                "spark_closed_loop",
                "Closed Loop Control",
                Library::RevRobotics,
                "The SPARK MAX runs its own PID loop at 1 kHz. A PIDController on the roboRIO is slower.",
            ),
            page(
                "limelight_aim",
                "Aiming with Limelight",
                Library::Limelight,
                "Read tx and feed it to a proportional controller.",
            ),
        ]
    }

    #[test]
    fn title_match_outranks_body_match() {
        let index = SearchIndex::build(&corpus());
        let hits = index.search("PIDController", &SearchOptions::default());

        assert!(hits.len() >= 2);
        assert_eq!(hits[0].doc.id, "pid_basics");
        assert!(hits.iter().any(|h| h.doc.id == "spark_closed_loop"));
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn typo_matches_through_fuzzy_expansion() {
        let index = SearchIndex::build(&corpus());
        let hits = index.search("pidcontroler", &SearchOptions::default());
        assert_eq!(hits[0].doc.id, "pid_basics");

        let strict = SearchOptions {
            fuzzy: 0.0,
            ..SearchOptions::default()
        };
        assert!(index.search("pidcontroler", &strict).is_empty());
    }

    #[test]
    fn partial_term_matches_through_prefix() {
        let index = SearchIndex::build(&corpus());
        let hits = index.search("feedfor", &SearchOptions::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc.id, "arm_tuning");
    }

    #[test]
    fn empty_query_and_empty_index() {
        let index = SearchIndex::build(&corpus());
        assert!(index.search("", &SearchOptions::default()).is_empty());
        assert!(index.search("!!!", &SearchOptions::default()).is_empty());

        let empty = SearchIndex::build(&[]);
        assert!(empty.is_empty());
        assert!(empty.search("pid", &SearchOptions::default()).is_empty());
    }

    #[test]
    fn deserialized_index_ranks_identically() {
        let index = SearchIndex::build(&corpus());
        let json = serde_json::to_string(&index).expect("serialize index");
        let restored: SearchIndex = serde_json::from_str(&json).expect("deserialize index");

        assert_eq!(restored, index);
        let before: Vec<(&str, f64)> = index
            .search("proportional", &SearchOptions::default())
            .iter()
            .map(|h| (h.doc.id.as_str(), h.score))
            .collect();
        let after: Vec<(&str, f64)> = restored
            .search("proportional", &SearchOptions::default())
            .iter()
            .map(|h| (h.doc.id.as_str(), h.score))
            .collect();
        assert_eq!(before, after);
    }
}
