//! Named predicate rules
//!
//! Heuristics are kept as ordered lists of named, case-insensitive regex
//! rules so site-specific rules can be added from configuration without
//! touching the crawl control flow.

use crate::config::{NavigationConfig, NoiseTarget, RuleAction};
use crate::ConfigError;
use regex::{Regex, RegexBuilder};

/// A single named, case-insensitive pattern
#[derive(Debug, Clone)]
pub struct NamedRule {
    name: String,
    pattern: Regex,
}

impl NamedRule {
    pub fn new(name: &str, pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            name: name.to_string(),
            pattern: compile(pattern)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, haystack: &str) -> bool {
        self.pattern.is_match(haystack)
    }
}

/// Compiles a case-insensitive pattern
pub(crate) fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
}

/// Outcome of evaluating a link against the navigation rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationVerdict {
    /// A deny rule matched; deny always wins
    Denied { rule: String },
    /// An allow rule matched, or no allow rules are configured (`rule` is `None`)
    Allowed { rule: Option<String> },
    /// Allow rules exist but none matched
    NoMatch,
}

/// Allow/deny rules for navigation links
///
/// Rules are evaluated against the link's `href` and its text. Deny rules take
/// precedence over allow rules regardless of their order in the configuration.
#[derive(Debug, Clone, Default)]
pub struct NavigationRules {
    allow: Vec<NamedRule>,
    deny: Vec<NamedRule>,
}

impl NavigationRules {
    pub fn from_config(config: &NavigationConfig) -> Result<Self, ConfigError> {
        let mut rules = Self::default();
        for entry in &config.rules {
            let rule = NamedRule::new(&entry.name, &entry.pattern)?;
            match entry.action {
                RuleAction::Allow => rules.allow.push(rule),
                RuleAction::Deny => rules.deny.push(rule),
            }
        }
        Ok(rules)
    }

    pub fn with_allow(mut self, rule: NamedRule) -> Self {
        self.allow.push(rule);
        self
    }

    pub fn with_deny(mut self, rule: NamedRule) -> Self {
        self.deny.push(rule);
        self
    }

    pub fn verdict(&self, href: &str, link_text: &str) -> NavigationVerdict {
        let hit = |rule: &NamedRule| rule.matches(href) || rule.matches(link_text);

        if let Some(rule) = self.deny.iter().find(|r| hit(r)) {
            return NavigationVerdict::Denied {
                rule: rule.name().to_string(),
            };
        }

        if self.allow.is_empty() {
            return NavigationVerdict::Allowed { rule: None };
        }

        match self.allow.iter().find(|r| hit(r)) {
            Some(rule) => NavigationVerdict::Allowed {
                rule: Some(rule.name().to_string()),
            },
            None => NavigationVerdict::NoMatch,
        }
    }

    pub fn is_navigation_link(&self, href: &str, link_text: &str) -> bool {
        matches!(
            self.verdict(href, link_text),
            NavigationVerdict::Allowed { .. }
        )
    }
}

/// Banner/background heuristics for media references
#[derive(Debug, Clone, Default)]
pub struct NoiseRules {
    rules: Vec<(NamedRule, NoiseTarget)>,
}

impl NoiseRules {
    pub fn new(rules: Vec<(NamedRule, NoiseTarget)>) -> Self {
        Self { rules }
    }

    /// Returns the name of the first rule that flags the reference as noise
    ///
    /// Url rules inspect `url`; context rules inspect the concatenated
    /// ancestor class/id/style text and are skipped when it is empty.
    pub fn first_match(&self, url: &str, context: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|(rule, target)| match target {
                NoiseTarget::Url => rule.matches(url),
                NoiseTarget::Context => !context.trim().is_empty() && rule.matches(context),
            })
            .map(|(rule, _)| rule.name())
    }

    pub fn is_noise_media(&self, url: &str, context: &str) -> bool {
        self.first_match(url, context).is_some()
    }
}
