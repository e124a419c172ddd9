//! Discovery sets owned by the crawl coordinator

use std::collections::{BTreeSet, HashSet};
use std::sync::Mutex;

/// Phase in which a target was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Home,
    Navigation,
    Media,
}

/// A normalized absolute URL tagged with its discovery phase
///
/// Identity is the URL string alone.
#[derive(Debug, Clone)]
pub struct CrawlTarget {
    url: String,
    kind: TargetKind,
}

impl CrawlTarget {
    pub fn new(url: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }
}

impl PartialEq for CrawlTarget {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for CrawlTarget {}

impl std::hash::Hash for CrawlTarget {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

/// Digests of every accepted payload
///
/// Downloads run concurrently, so the set is behind a mutex; the lock is never
/// held across an await point. A digest is reserved before the payload is
/// written and released again if the write fails.
#[derive(Debug, Default)]
pub struct DigestSet {
    digests: Mutex<HashSet<String>>,
}

impl DigestSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, digest: &str) -> bool {
        self.lock().contains(digest)
    }

    /// Atomically registers `digest`; false if it was already present
    pub fn reserve(&self, digest: &str) -> bool {
        self.lock().insert(digest.to_string())
    }

    /// Rolls back a reservation whose payload was never persisted
    pub fn release(&self, digest: &str) {
        self.lock().remove(digest);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        // A poisoned set still holds valid digests
        self.digests.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Mutable discovery state of one crawl run
#[derive(Debug)]
pub struct CrawlState {
    home: CrawlTarget,
    visited: HashSet<String>,
    navigation: BTreeSet<String>,
    navigation_frozen: bool,
    media: BTreeSet<String>,
    digests: DigestSet,
}

impl CrawlState {
    pub fn new(home_url: impl Into<String>) -> Self {
        Self {
            home: CrawlTarget::new(home_url, TargetKind::Home),
            visited: HashSet::new(),
            navigation: BTreeSet::new(),
            navigation_frozen: false,
            media: BTreeSet::new(),
            digests: DigestSet::new(),
        }
    }

    pub fn home(&self) -> &CrawlTarget {
        &self.home
    }

    /// Records a page as fetched; false if it was already visited
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Adds navigation targets; ignored once the set is frozen
    ///
    /// Returns how many new targets were added.
    pub fn add_navigation<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        if self.navigation_frozen {
            return 0;
        }
        urls.into_iter()
            .filter(|url| self.navigation.insert(url.clone()))
            .count()
    }

    /// Freezes the navigation set at the end of discovery
    pub fn freeze_navigation(&mut self) {
        self.navigation_frozen = true;
    }

    pub fn navigation(&self) -> &BTreeSet<String> {
        &self.navigation
    }

    /// Claims up to `max` unvisited navigation targets
    ///
    /// Claimed URLs are inserted into the visited set in the same step, so a
    /// URL can never be pending and visited at once, nor dispatched twice.
    pub fn claim_batch(&mut self, max: usize) -> Vec<CrawlTarget> {
        let batch: Vec<String> = self
            .navigation
            .iter()
            .filter(|url| !self.visited.contains(url.as_str()))
            .take(max)
            .cloned()
            .collect();

        for url in &batch {
            self.visited.insert(url.clone());
        }

        batch
            .into_iter()
            .map(|url| CrawlTarget::new(url, TargetKind::Navigation))
            .collect()
    }

    pub fn has_unvisited_navigation(&self) -> bool {
        self.navigation.iter().any(|url| !self.visited.contains(url))
    }

    /// Adds media candidates; returns how many were new
    pub fn add_media<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        urls.into_iter()
            .filter(|url| self.media.insert(url.clone()))
            .count()
    }

    /// Snapshot of every media candidate, read once by the fetch phase
    pub fn media_targets(&self) -> Vec<CrawlTarget> {
        self.media
            .iter()
            .map(|url| CrawlTarget::new(url.clone(), TargetKind::Media))
            .collect()
    }

    pub fn media(&self) -> &BTreeSet<String> {
        &self.media
    }

    pub fn digests(&self) -> &DigestSet {
        &self.digests
    }
}
