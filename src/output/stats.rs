//! Crawl counters and their console rendering

use crate::output::CrawlReport;

/// Stats counter that a media rejection is folded into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectCategory {
    Duplicate,
    SizeOrDimension,
    Other,
}

/// Counters accumulated over one crawl run
///
/// Updates are plain increments, so the order in which concurrent operations
/// complete does not affect the totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages_crawled: u64,
    pub media_found: u64,
    pub media_downloaded: u64,
    pub duplicates_rejected: u64,
    pub size_or_dimension_rejected: u64,
    pub other_rejected: u64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_page(&mut self) {
        self.pages_crawled += 1;
    }

    pub fn record_download(&mut self) {
        self.media_downloaded += 1;
    }

    pub fn record_rejection(&mut self, category: RejectCategory) {
        match category {
            RejectCategory::Duplicate => self.duplicates_rejected += 1,
            RejectCategory::SizeOrDimension => self.size_or_dimension_rejected += 1,
            RejectCategory::Other => self.other_rejected += 1,
        }
    }

    pub fn total_rejected(&self) -> u64 {
        self.duplicates_rejected + self.size_or_dimension_rejected + self.other_rejected
    }

    /// Share of found media that was saved, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.media_found == 0 {
            return 0.0;
        }
        (self.media_downloaded as f64 / self.media_found as f64) * 100.0
    }
}

/// Prints the final report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    let stats = &report.stats;

    println!("=== Harvest Report ===\n");
    println!("Entry page: {}", report.entry_url);
    println!("Output directory: {}", report.output_directory);
    println!("Elapsed: {:.2}s", report.elapsed_seconds);
    if report.cancelled {
        println!("Run was cancelled before completion");
    }
    println!();

    println!("Pages crawled: {}", stats.pages_crawled);
    println!("Media found: {}", stats.media_found);
    println!("Media downloaded: {}", stats.media_downloaded);
    println!();

    println!("Rejections:");
    println!("  Duplicates: {}", stats.duplicates_rejected);
    println!("  Size or dimension: {}", stats.size_or_dimension_rejected);
    println!("  Other: {}", stats.other_rejected);
    println!();

    if stats.media_found == 0 {
        println!("No media candidates were found on the crawled pages");
    } else {
        println!(
            "Success Rate: {:.1}% ({} / {} media saved)",
            stats.success_rate(),
            stats.media_downloaded,
            stats.media_found
        );
    }
}
