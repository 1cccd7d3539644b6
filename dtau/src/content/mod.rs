//! Content normalization applied to admin input before it is stored.
//!
//! - [`tags`]: folds comma-separated, array-literal and multi-value tag input
//!   into clean tag lists
//! - [`sanitize`]: allowlist HTML sanitizer for rich-text descriptions

pub mod sanitize;
pub mod tags;

pub use sanitize::sanitize_html;
pub use tags::{TagInput, normalize as normalize_tags};
