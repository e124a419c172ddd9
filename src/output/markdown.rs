//! Markdown report generation
//!
//! This module renders the final crawl report as a human-readable markdown
//! file.

use crate::output::report::{CrawlReport, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown rendering of `report` to `output_path`
///
/// # Arguments
///
/// * `report` - The final crawl report
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn generate_markdown_report(report: &CrawlReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_report(report: &CrawlReport) -> String {
    let stats = &report.stats;
    let mut md = String::new();

    md.push_str("# Pixel-Harvest Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Entry Page**: {}\n", report.entry_url));
    md.push_str(&format!(
        "- **Output Directory**: {}\n",
        report.output_directory
    ));
    md.push_str(&format!("- **Started**: {}\n", report.started_at));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        report.elapsed_seconds
    ));
    if let Some(hash) = &report.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    if report.cancelled {
        md.push_str("- **Status**: cancelled\n");
    } else {
        md.push_str("- **Status**: completed\n");
    }
    md.push('\n');

    // Counters
    md.push_str("## Results\n\n");
    md.push_str("| Counter | Value |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Pages crawled | {} |\n", stats.pages_crawled));
    md.push_str(&format!("| Media found | {} |\n", stats.media_found));
    md.push_str(&format!(
        "| Media downloaded | {} |\n",
        stats.media_downloaded
    ));
    md.push_str(&format!(
        "| Duplicates rejected | {} |\n",
        stats.duplicates_rejected
    ));
    md.push_str(&format!(
        "| Size or dimension rejected | {} |\n",
        stats.size_or_dimension_rejected
    ));
    md.push_str(&format!("| Other rejected | {} |\n\n", stats.other_rejected));

    if stats.media_found == 0 {
        md.push_str("No media candidates were found on the crawled pages.\n");
    } else {
        md.push_str(&format!(
            "**Success Rate**: {:.1}%\n",
            stats.success_rate()
        ));
    }

    md
}
