//! Final run report

use crate::output::CrawlStats;
use thiserror::Error;

/// Errors that can occur while writing reports
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary of one crawl run
///
/// Together with the output directory this is the whole contract with any
/// downstream consumer of the harvested files.
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub entry_url: String,
    pub output_directory: String,
    pub started_at: String,
    pub finished_at: String,
    pub elapsed_seconds: f64,
    pub config_hash: Option<String>,
    /// True when the run stopped early on a cancellation request
    pub cancelled: bool,
    pub stats: CrawlStats,
}

impl CrawlReport {
    pub fn pages_crawled(&self) -> u64 {
        self.stats.pages_crawled
    }

    pub fn media_found(&self) -> u64 {
        self.stats.media_found
    }

    pub fn media_downloaded(&self) -> u64 {
        self.stats.media_downloaded
    }

    pub fn duplicates_rejected(&self) -> u64 {
        self.stats.duplicates_rejected
    }

    pub fn size_or_dimension_rejected(&self) -> u64 {
        self.stats.size_or_dimension_rejected
    }

    pub fn other_rejected(&self) -> u64 {
        self.stats.other_rejected
    }

    pub fn success_rate(&self) -> f64 {
        self.stats.success_rate()
    }
}
