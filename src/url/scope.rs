/// Whitelist of host/path substrings defining the crawl scope
///
/// Matching is case-insensitive. The predicate is total: any string, well
/// formed or not, yields a plain `bool`.
#[derive(Debug, Clone, Default)]
pub struct ScopeFilter {
    patterns: Vec<String>,
}

impl ScopeFilter {
    /// Builds a filter from raw patterns; blank patterns are dropped
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Returns true if `url` contains at least one scope pattern
    ///
    /// # Examples
    ///
    /// ```
    /// use pixel_harvest::url::ScopeFilter;
    ///
    /// let scope = ScopeFilter::new(["sites.example.com", "/view/"]);
    /// assert!(scope.contains("https://SITES.example.com/page"));
    /// assert!(scope.contains("https://mirror.net/view/page"));
    /// assert!(!scope.contains("https://other.org/page"));
    /// ```
    pub fn contains(&self, url: &str) -> bool {
        let lowered = url.to_lowercase();
        self.patterns.iter().any(|p| lowered.contains(p.as_str()))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
