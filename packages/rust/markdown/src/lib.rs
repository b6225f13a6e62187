//! Markup normalization for frc-docs.
//!
//! - [`rst`]: reStructuredText to markdown, used for the WPILib source tree
//! - [`html`]: boilerplate stripping before model-assisted conversion
//! - [`title`]: title derivation for converted pages

pub mod html;
pub mod rst;
pub mod title;

pub use html::{strip_boilerplate, truncate_chars};
pub use rst::{convert_inline, normalize};
pub use title::{extract_title, humanize_slug};
