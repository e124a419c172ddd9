//! Output module for harvested files and run reports
//!
//! This module handles:
//! - Preparing the output directory and naming saved media files
//! - Counting crawl outcomes
//! - Rendering the final report to the console and to markdown

mod files;
mod markdown;
mod report;
pub mod stats;

pub use files::{output_file_name, persist, prepare_output_dir, DIGEST_PREFIX_LEN};
pub use markdown::{format_markdown_report, generate_markdown_report};
pub use report::{CrawlReport, OutputError, OutputResult};
pub use stats::{print_report, CrawlStats, RejectCategory};
