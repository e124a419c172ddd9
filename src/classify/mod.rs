//! Candidate classifier
//!
//! Decides whether a discovered link is a navigation target and whether a
//! discovered media reference is decorative noise. Both are heuristics tuned
//! for precision on known noise; oversize and undersize payloads that slip
//! through are gated later by the downloader.

mod rules;

pub use rules::{NamedRule, NavigationRules, NavigationVerdict, NoiseRules};

use crate::config::Config;
use crate::ConfigError;
use regex::Regex;

/// All classification heuristics for one crawl
#[derive(Debug, Clone)]
pub struct Classifier {
    navigation: NavigationRules,
    noise: NoiseRules,
    section_markers: Regex,
    catalog_markers: Regex,
    background_context: Regex,
    image_extension: Regex,
    image_hosts: Vec<String>,
}

impl Classifier {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let media = &config.media;

        let noise = media
            .noise_rules
            .iter()
            .map(|entry| Ok((NamedRule::new(&entry.name, &entry.pattern)?, entry.target)))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let extensions = media
            .extensions
            .iter()
            .map(|ext| regex::escape(ext))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            navigation: NavigationRules::from_config(&config.navigation)?,
            noise: NoiseRules::new(noise),
            section_markers: rules::compile(&media.section_markers)?,
            catalog_markers: rules::compile(&media.catalog_markers)?,
            background_context: rules::compile(&media.background_context_markers)?,
            image_extension: rules::compile(&format!(r"\.({})(\?|$)", extensions))?,
            image_hosts: media.image_hosts.iter().map(|h| h.to_lowercase()).collect(),
        })
    }

    pub fn is_navigation_link(&self, href: &str, link_text: &str) -> bool {
        self.navigation.is_navigation_link(href, link_text)
    }

    pub fn navigation_verdict(&self, href: &str, link_text: &str) -> NavigationVerdict {
        self.navigation.verdict(href, link_text)
    }

    pub fn is_noise_media(&self, url: &str, context: &str) -> bool {
        self.noise.is_noise_media(url, context)
    }

    pub fn noise_rule(&self, url: &str, context: &str) -> Option<&str> {
        self.noise.first_match(url, context)
    }

    /// True if the URL has an image extension or is served by a known image host
    pub fn looks_like_image(&self, url: &str) -> bool {
        if self.image_extension.is_match(url) {
            return true;
        }
        let lowered = url.to_lowercase();
        self.image_hosts.iter().any(|h| lowered.contains(h.as_str()))
    }

    /// Header/hero/banner sections removed before media scanning
    pub fn is_header_section(&self, class_and_id: &str) -> bool {
        self.section_markers.is_match(class_and_id)
    }

    /// Catalog sections removed before media scanning
    pub fn is_catalog_section(&self, class_or_id: &str) -> bool {
        self.catalog_markers.is_match(class_or_id)
    }

    /// Header, banner or catalog marker anywhere in an ancestor chain
    pub fn has_structural_marker(&self, ancestor_context: &str) -> bool {
        self.section_markers.is_match(ancestor_context)
            || self.catalog_markers.is_match(ancestor_context)
    }

    /// Element context under which inline background images are not collected
    pub fn suppresses_background(&self, context: &str) -> bool {
        self.background_context.is_match(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn classifier() -> Classifier {
        let config = parse_config(
            r#"
[crawl]
entry-url = "https://sites.example.com/view/guide/home"
scope = ["sites.example.com"]

[output]
directory = "./out"
"#,
        )
        .unwrap();
        Classifier::from_config(&config).unwrap()
    }

    #[test]
    fn test_looks_like_image_by_extension() {
        let c = classifier();
        assert!(c.looks_like_image("https://example.com/a/photo.JPG"));
        assert!(c.looks_like_image("https://example.com/a/photo.png?v=3"));
        assert!(c.looks_like_image("https://example.com/a/icon.svg"));
        assert!(!c.looks_like_image("https://example.com/a/page.html"));
        assert!(!c.looks_like_image("https://example.com/a/photo.png.html"));
    }

    #[test]
    fn test_looks_like_image_by_host() {
        let c = classifier();
        assert!(c.looks_like_image("https://lh3.googleusercontent.com/AbCdEf=w1280"));
        assert!(c.looks_like_image("https://yt3.ggpht.com/xyz"));
        assert!(!c.looks_like_image("https://cdn.example.com/xyz"));
    }

    #[test]
    fn test_section_markers() {
        let c = classifier();
        assert!(c.is_header_section("site-header sticky"));
        assert!(c.is_header_section("HeroBlock"));
        assert!(!c.is_header_section("content"));

        assert!(c.is_catalog_section("catalogue-illegal"));
        assert!(c.is_catalog_section("product-catalog"));
        assert!(!c.is_catalog_section("gallery"));

        assert!(c.has_structural_marker(" div content  main banner-top"));
        assert!(!c.has_structural_marker(" div content  body"));
    }

    #[test]
    fn test_background_suppression() {
        let c = classifier();
        assert!(c.suppresses_background("bg-main section"));
        assert!(c.suppresses_background("background-large"));
        assert!(!c.suppresses_background("card"));
    }

    #[test]
    fn test_default_navigation_denies_catalogue() {
        let c = classifier();
        assert!(c.is_navigation_link("/view/guide/police", "Police"));
        assert!(!c.is_navigation_link("/view/guide/catalogue", "Catalogue"));
    }
}
