use crate::config::types::{
    Config, CrawlConfig, FetchConfig, LimitsConfig, MediaConfig, NavigationConfig, OutputConfig,
};
use crate::ConfigError;
use regex::RegexBuilder;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_fetch_config(&config.fetch)?;
    validate_navigation_config(&config.navigation)?;
    validate_media_config(&config.media)?;
    validate_limits_config(&config.limits)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the crawl target
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.entry_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid entry-url '{}': {}", config.entry_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "entry-url '{}' must use http or https",
            config.entry_url
        )));
    }

    if config.scope.is_empty() {
        return Err(ConfigError::Validation(
            "scope must contain at least one pattern".to_string(),
        ));
    }

    if config.scope.iter().any(|p| p.trim().is_empty()) {
        return Err(ConfigError::InvalidPattern(
            "scope patterns cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates network settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 || config.max_concurrent > 100 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent must be between 1 and 100, got {}",
            config.max_concurrent
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_navigation_config(config: &NavigationConfig) -> Result<(), ConfigError> {
    for rule in &config.rules {
        if rule.name.is_empty() {
            return Err(ConfigError::Validation(
                "navigation rule name cannot be empty".to_string(),
            ));
        }
        validate_pattern(&rule.pattern)?;
    }
    Ok(())
}

fn validate_media_config(config: &MediaConfig) -> Result<(), ConfigError> {
    for rule in &config.noise_rules {
        if rule.name.is_empty() {
            return Err(ConfigError::Validation(
                "noise rule name cannot be empty".to_string(),
            ));
        }
        validate_pattern(&rule.pattern)?;
    }

    validate_pattern(&config.section_markers)?;
    validate_pattern(&config.catalog_markers)?;
    validate_pattern(&config.background_context_markers)?;

    if config.extensions.is_empty() {
        return Err(ConfigError::Validation(
            "media extensions cannot be empty".to_string(),
        ));
    }

    if let Some(bad) = config
        .extensions
        .iter()
        .find(|ext| ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()))
    {
        return Err(ConfigError::Validation(format!(
            "media extension '{}' must be non-empty and alphanumeric",
            bad
        )));
    }

    Ok(())
}

fn validate_limits_config(config: &LimitsConfig) -> Result<(), ConfigError> {
    if config.max_bytes == 0 {
        return Err(ConfigError::Validation(
            "max-bytes must be > 0".to_string(),
        ));
    }

    if config.min_dimension > config.max_width || config.min_dimension > config.max_height {
        return Err(ConfigError::Validation(format!(
            "min-dimension {} exceeds the dimension ceiling {}x{}",
            config.min_dimension, config.max_width, config.max_height
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if !config
        .file_prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(ConfigError::Validation(format!(
            "file-prefix '{}' contains unsafe characters",
            config.file_prefix
        )));
    }

    Ok(())
}

/// Checks that a rule pattern compiles as a case-insensitive regex
fn validate_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "pattern cannot be empty".to_string(),
        ));
    }

    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
}
