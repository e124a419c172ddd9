//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the orchestrator's state machine
//! - `CrawlState`: visited pages, navigation targets and media candidates
//! - `DigestSet`: content digests of accepted payloads

mod crawl_state;
mod phase;

// Re-export main types
pub use crawl_state::{CrawlState, CrawlTarget, DigestSet, TargetKind};
pub use phase::CrawlPhase;
