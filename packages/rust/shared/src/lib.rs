//! Shared types, error model, and configuration for frc-docs.
//!
//! This crate is the foundation depended on by all other frc-docs crates.
//! It provides:
//! - [`FrcDocsError`], the unified error type
//! - Domain types ([`Library`], [`Page`], [`SearchResult`], [`BundleMetadata`])
//! - Configuration ([`AppConfig`], config loading, credential lookup)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ExtractionConfig, GeminiConfig, SourcesConfig, api_key,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{FrcDocsError, Result};
pub use types::{
    BundleMetadata, Library, LibraryCount, Page, SearchResult, UNTITLED, derive_id,
    estimate_tokens, page_id_from_url,
};
