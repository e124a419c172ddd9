//! URL handling module for Pixel-Harvest
//!
//! This module provides reference resolution, normalization and the crawl
//! scope filter.

mod normalize;
mod scope;

// Re-export main functions
pub use normalize::{normalize_media_url, normalize_page_url, resolve, strip_query};
pub use scope::ScopeFilter;
