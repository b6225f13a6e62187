//! HTTP plumbing and the recursive same-origin crawler.
//!
//! This crate provides:
//! - [`client`]: shared client construction and best-effort fetch helpers
//! - [`engine`]: breadth-first crawl used as the discovery fallback

pub mod client;
pub mod engine;

pub use client::{USER_AGENT, build_client, fetch_html, fetch_text};
pub use engine::{Crawler, extract_links, normalize_url};
