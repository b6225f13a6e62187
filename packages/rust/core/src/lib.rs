//! Ingestion pipeline for frc-docs.
//!
//! This crate ties together discovery, source-tree normalization,
//! model-assisted HTML conversion and bundle persistence into the two
//! offline workflows: [`pipeline::scrape`] and [`postprocess::postprocess`].

pub mod extractor;
pub mod generator;
pub mod pipeline;
pub mod postprocess;
pub mod source;

pub use extractor::{CONVERSION_PROMPT, ContentExtractor, ExtractOptions, extract_page};
pub use generator::{GeminiGenerator, TextGenerator};
pub use pipeline::{ProgressReporter, ScrapeSummary, SilentProgress, Source, scrape, scrape_with};
pub use postprocess::{RepairReport, postprocess, repair_pages};
pub use source::{extract_source_tree, extract_wpilib};
