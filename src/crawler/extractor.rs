//! HTML extraction of navigation links and media candidates
//!
//! Navigation links are read from the entry page only. Media candidates are
//! collected from every other navigation page in two passes:
//!
//! 1. **Structural pass**: header, hero, banner and catalog sections are
//!    excluded first; the remaining `<img>` elements and inline
//!    `background(-image): url(...)` styles are collected.
//! 2. **Recall pass**: every `<img>` is revisited with its ancestor chain as
//!    context and kept unless that chain carries a structural marker.
//!
//! The recall pass judges an image by its ancestor chain alone, without the
//! image's own `alt`, `title` or style text, so it can recover images the
//! first pass dropped on those attributes. Its results are unioned with the
//! first pass and it never removes a candidate. Both passes run every
//! candidate through the same normalize, noise and "looks like an image"
//! checks.

use crate::classify::{Classifier, NavigationVerdict};
use crate::url::{normalize_media_url, normalize_page_url, ScopeFilter};
use crate::ConfigError;
use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Source attributes in priority order; the first non-empty one wins
const PRIMARY_SOURCE_ATTRS: [&str; 5] = ["src", "data-src", "data-lazy-src", "data-original", "srcset"];

/// Source attributes consulted by the recall pass
const RECALL_SOURCE_ATTRS: [&str; 4] = ["src", "data-src", "data-lazy-src", "data-original"];

const BACKGROUND_URL: &str = r#"background(?:-image)?\s*:\s*url\(\s*["']?([^"')]+?)["']?\s*\)"#;

/// Extracts navigation links and media candidates from parsed pages
#[derive(Debug, Clone)]
pub struct Extractor {
    classifier: Classifier,
    scope: ScopeFilter,
    anchors: Selector,
    images: Selector,
    styled: Selector,
    background_url: Regex,
}

impl Extractor {
    pub fn new(classifier: Classifier, scope: ScopeFilter) -> Result<Self, ConfigError> {
        Ok(Self {
            classifier,
            scope,
            anchors: selector("a[href]")?,
            images: selector("img")?,
            styled: selector("[style]")?,
            background_url: RegexBuilder::new(BACKGROUND_URL)
                .case_insensitive(true)
                .build()
                .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?,
        })
    }

    /// Collects in-scope navigation links from a page
    ///
    /// A link is kept when its normalized URL is in scope, has not been
    /// visited, and passes the navigation rules on its `href` and text.
    /// Anchors carrying a `download` attribute are skipped.
    pub fn extract_navigation<F>(
        &self,
        document: &Html,
        page_url: &Url,
        is_visited: F,
    ) -> BTreeSet<String>
    where
        F: Fn(&str) -> bool,
    {
        let mut links = BTreeSet::new();

        for anchor in document.select(&self.anchors) {
            let element = anchor.value();
            if element.attr("download").is_some() {
                continue;
            }

            let href = match element.attr("href") {
                Some(href) => href,
                None => continue,
            };

            let normalized = match normalize_page_url(href, page_url, &self.scope) {
                Some(url) => url,
                None => continue,
            };

            if is_visited(&normalized) || links.contains(&normalized) {
                continue;
            }

            let text = anchor.text().collect::<String>();
            let text = text.trim();

            match self.classifier.navigation_verdict(href, text) {
                NavigationVerdict::Allowed { rule } => {
                    tracing::debug!(
                        "Navigation link {} ({})",
                        normalized,
                        rule.as_deref().unwrap_or("no allow rules")
                    );
                    links.insert(normalized);
                }
                NavigationVerdict::Denied { rule } => {
                    tracing::debug!("Skipping {}: denied by rule '{}'", normalized, rule);
                }
                NavigationVerdict::NoMatch => {
                    tracing::trace!("Skipping {}: no allow rule matched", normalized);
                }
            }
        }

        links
    }

    /// Collects media candidates from a page using both passes
    pub fn extract_media(&self, document: &Html, page_url: &Url) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        self.structural_pass(document, page_url, &mut found);
        let first_pass = found.len();
        self.recall_pass(document, page_url, &mut found);

        tracing::debug!(
            "{}: {} media candidates ({} from recall pass)",
            page_url,
            found.len(),
            found.len() - first_pass
        );
        found
    }

    /// True for the root element of a header/hero/banner or catalog section
    fn is_section_root(&self, element: &ElementRef) -> bool {
        let value = element.value();
        let class = value.attr("class").unwrap_or("");
        let id = value.attr("id").unwrap_or("");

        let header_like = value.name() == "header"
            || (value.name() == "div"
                && self.classifier.is_header_section(&format!("{} {}", class, id)));

        header_like || self.classifier.is_catalog_section(class) || self.classifier.is_catalog_section(id)
    }

    /// True if the element or one of its ancestors roots an excluded section
    fn in_excluded_section(&self, element: &ElementRef) -> bool {
        self.is_section_root(element)
            || element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| self.is_section_root(&ancestor))
    }

    fn structural_pass(&self, document: &Html, page_url: &Url, found: &mut BTreeSet<String>) {
        for image in document.select(&self.images) {
            if self.in_excluded_section(&image) {
                continue;
            }

            let raw = match first_source(&image, &PRIMARY_SOURCE_ATTRS) {
                Some(raw) => raw,
                None => continue,
            };

            let mut context = attr_context(&image, &["class", "alt", "title"]);
            context.push_str(&ancestor_attrs(&image, &["class", "id", "style"]));

            if let Some(url) = self.admit(raw, page_url, &context) {
                found.insert(url);
            }
        }

        for element in document.select(&self.styled) {
            if self.in_excluded_section(&element) {
                continue;
            }

            let own = attr_context(&element, &["class", "id"]);
            if self.classifier.suppresses_background(&own) {
                continue;
            }

            let style = element.value().attr("style").unwrap_or("");
            let mut context = attr_context(&element, &["class", "id", "style"]);
            context.push_str(&ancestor_attrs(&element, &["class", "id", "style"]));

            for captures in self.background_url.captures_iter(style) {
                if let Some(raw) = captures.get(1) {
                    if let Some(url) = self.admit(raw.as_str(), page_url, &context) {
                        found.insert(url);
                    }
                }
            }
        }
    }

    fn recall_pass(&self, document: &Html, page_url: &Url, found: &mut BTreeSet<String>) {
        for image in document.select(&self.images) {
            let mut context = String::new();
            for ancestor in image.ancestors().filter_map(ElementRef::wrap) {
                let value = ancestor.value();
                context.push_str(&format!(
                    " {} {} {}",
                    value.name(),
                    value.attr("class").unwrap_or(""),
                    value.attr("id").unwrap_or("")
                ));
            }

            if self.classifier.has_structural_marker(&context) {
                continue;
            }

            let raw = match first_source(&image, &RECALL_SOURCE_ATTRS) {
                Some(raw) => raw,
                None => continue,
            };

            if let Some(url) = self.admit(raw, page_url, &context) {
                found.insert(url);
            }
        }
    }

    /// Normalizes a raw reference and applies the noise and image checks
    fn admit(&self, raw: &str, page_url: &Url, context: &str) -> Option<String> {
        let url = normalize_media_url(raw, page_url)?;

        if let Some(rule) = self.classifier.noise_rule(&url, context) {
            tracing::trace!("Dropping {}: noise rule '{}'", url, rule);
            return None;
        }

        if !self.classifier.looks_like_image(&url) {
            return None;
        }

        Some(url)
    }
}

fn selector(css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::InvalidPattern(format!("'{}': {:?}", css, e)))
}

/// First non-empty source attribute; `srcset` yields its first candidate URL
fn first_source<'a>(element: &ElementRef<'a>, attrs: &[&str]) -> Option<&'a str> {
    let value = element.value();
    attrs.iter().find_map(|name| {
        let raw = value.attr(name)?.trim();
        if raw.is_empty() {
            return None;
        }
        if *name == "srcset" {
            raw.split(',').next()?.split_whitespace().next()
        } else {
            Some(raw)
        }
    })
}

fn attr_context(element: &ElementRef, attrs: &[&str]) -> String {
    let value = element.value();
    attrs
        .iter()
        .map(|name| value.attr(name).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ")
}

fn ancestor_attrs(element: &ElementRef, attrs: &[&str]) -> String {
    let mut context = String::new();
    for ancestor in element.ancestors().filter_map(ElementRef::wrap) {
        context.push(' ');
        context.push_str(&attr_context(&ancestor, attrs));
    }
    context
}
