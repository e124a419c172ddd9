//! Crawler module for page fetching, extraction and media download
//!
//! This module contains the core harvesting logic, including:
//! - Bounded, paced HTTP fetching
//! - HTML extraction of navigation links and media candidates
//! - Content-addressed media download with size and duplicate gating
//! - Overall phase coordination

mod coordinator;
mod downloader;
mod extractor;
mod fetcher;
mod limiter;

pub use coordinator::{run_crawl, Coordinator};
pub use downloader::{DimensionProbe, DownloadOutcome, Downloader, ImageProbe, RejectReason};
pub use extractor::Extractor;
pub use fetcher::{build_http_client, BoundedFetcher, FetchError, FetchedMedia, FetchedPage};
pub use limiter::Limiter;
