use serde::Deserialize;

/// Main configuration structure for Pixel-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    pub output: OutputConfig,
}

/// Crawl target configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// The entry (home) page of the site
    #[serde(rename = "entry-url")]
    pub entry_url: String,

    /// Case-insensitive substrings; a URL containing any of them is in scope
    pub scope: Vec<String>,

    /// Substrings marking a page as a duplicate entry of the home page
    #[serde(rename = "home-markers", default = "default_home_markers")]
    pub home_markers: Vec<String>,
}

/// Network behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum number of concurrent page fetches
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: u32,

    /// Pacing delay after acquiring a page permit (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Pacing delay after acquiring a media permit (milliseconds)
    #[serde(rename = "media-delay-ms")]
    pub media_delay_ms: u64,

    /// Total per-request timeout for pages; media requests get twice this
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            request_delay_ms: 500,
            media_delay_ms: 200,
            request_timeout_secs: 45,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

/// What a navigation rule does when it matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Deny,
}

/// A named navigation rule
#[derive(Debug, Clone, Deserialize)]
pub struct NavigationRuleEntry {
    pub name: String,
    /// Case-insensitive regular expression
    pub pattern: String,
    pub action: RuleAction,
}

/// Navigation link classification
#[derive(Debug, Clone, Deserialize)]
pub struct NavigationConfig {
    #[serde(rename = "rule", default = "default_navigation_rules")]
    pub rules: Vec<NavigationRuleEntry>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            rules: default_navigation_rules(),
        }
    }
}

/// Which string a noise rule inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseTarget {
    Url,
    Context,
}

/// A named noise rule
#[derive(Debug, Clone, Deserialize)]
pub struct NoiseRuleEntry {
    pub name: String,
    /// Case-insensitive regular expression
    pub pattern: String,
    pub target: NoiseTarget,
}

/// Media candidate classification
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    #[serde(rename = "noise-rule")]
    pub noise_rules: Vec<NoiseRuleEntry>,

    /// Class/id pattern of header-like sections removed before scanning
    #[serde(rename = "section-markers")]
    pub section_markers: String,

    /// Class/id pattern of catalog sections removed before scanning
    #[serde(rename = "catalog-markers")]
    pub catalog_markers: String,

    /// Context pattern that disables inline background-image extraction
    #[serde(rename = "background-context-markers")]
    pub background_context_markers: String,

    /// Hosts known to serve images without a file extension
    #[serde(rename = "image-hosts")]
    pub image_hosts: Vec<String>,

    /// Recognized image file extensions (without the dot)
    pub extensions: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            noise_rules: default_noise_rules(),
            section_markers: "header|banner|hero|cover".to_string(),
            catalog_markers: "catalog(ue)?".to_string(),
            background_context_markers: "header|banner|hero|cover|background.*large|bg.*main"
                .to_string(),
            image_hosts: vec![
                "googleusercontent.com".to_string(),
                "ggpht.com".to_string(),
                "lh3.google".to_string(),
            ],
            extensions: ["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Payload gating limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Hard byte ceiling for a single payload
    #[serde(rename = "max-bytes")]
    pub max_bytes: usize,

    /// Minimum width and height in pixels
    #[serde(rename = "min-dimension")]
    pub min_dimension: u32,

    #[serde(rename = "max-width")]
    pub max_width: u32,

    #[serde(rename = "max-height")]
    pub max_height: u32,

    /// Probe pixel dimensions; when false the byte heuristic is used instead
    #[serde(rename = "decode-dimensions")]
    pub decode_dimensions: bool,

    /// Minimum payload size when dimensions are not probed
    #[serde(rename = "min-bytes-without-decoder")]
    pub min_bytes_without_decoder: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_bytes: 15 * 1024 * 1024,
            min_dimension: 100,
            max_width: 4000,
            max_height: 3000,
            decode_dimensions: true,
            min_bytes_without_decoder: 1000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the accepted media files
    pub directory: String,

    /// Prefix prepended to every saved file name
    #[serde(rename = "file-prefix", default)]
    pub file_prefix: String,

    /// Optional path of the markdown report
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

fn default_home_markers() -> Vec<String> {
    vec!["home".to_string()]
}

fn default_navigation_rules() -> Vec<NavigationRuleEntry> {
    vec![NavigationRuleEntry {
        name: "catalogue".to_string(),
        pattern: "catalog(ue)?".to_string(),
        action: RuleAction::Deny,
    }]
}

fn default_noise_rules() -> Vec<NoiseRuleEntry> {
    let url_rule = |name: &str, pattern: &str| NoiseRuleEntry {
        name: name.to_string(),
        pattern: pattern.to_string(),
        target: NoiseTarget::Url,
    };

    vec![
        url_rule("header-background", "header.*background"),
        url_rule("main-banner", "banner.*main"),
        url_rule("wallpaper", "wallpaper"),
        url_rule("backdrop", "backdrop"),
        url_rule("catalogue-illegal", "catalogue.*illegal"),
        NoiseRuleEntry {
            name: "hero-context".to_string(),
            pattern: "main.*header|hero.*banner|cover.*background".to_string(),
            target: NoiseTarget::Context,
        },
    ]
}
