//! Phase definitions for the crawl state machine
//!
//! A run moves strictly forward: `Init → Discover → CrawlNav → FetchMedia → Done`.
//! A failed entry page or a cancellation jumps straight to `Done`.

use std::fmt;

/// Current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Nothing has happened yet
    Init,

    /// Fetching the entry page and collecting navigation targets
    Discover,

    /// Fetching navigation pages and collecting media candidates
    CrawlNav,

    /// Downloading media candidates
    FetchMedia,

    /// Final; shared sets are no longer mutated
    Done,
}

impl CrawlPhase {
    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::Discover)
                | (Self::Discover, Self::CrawlNav)
                | (Self::Discover, Self::Done)
                | (Self::CrawlNav, Self::FetchMedia)
                | (Self::CrawlNav, Self::Done)
                | (Self::FetchMedia, Self::Done)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Discover => "discover",
            Self::CrawlNav => "crawl_nav",
            Self::FetchMedia => "fetch_media",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
