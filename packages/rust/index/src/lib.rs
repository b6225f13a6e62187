//! Full-text search index for documentation pages.
//!
//! Titles and bodies are indexed separately and scored with BM25+. Query
//! terms are expanded to prefix completions and fuzzy neighbours before
//! scoring. The whole index is a plain serde value so it can be embedded in
//! the bundle and rehydrated without rebuilding.

mod expand;
mod index;
mod tokenizer;

pub use expand::{MAX_FUZZY_DISTANCE, fuzzy_distance};
pub use index::{Field, SearchHit, SearchIndex, SearchOptions, StoredDoc};
pub use tokenizer::tokenize;
