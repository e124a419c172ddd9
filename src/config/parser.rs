use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use pixel_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Max concurrent: {}", config.fetch.max_concurrent);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is recorded in the run report so a set of harvested files can be
/// traced back to the exact configuration that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NoiseTarget, RuleAction};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const MINIMAL: &str = r#"
[crawl]
entry-url = "https://sites.example.com/view/guide/home"
scope = ["sites.example.com"]

[output]
directory = "./harvest"
"#;

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let file = create_temp_config(MINIMAL);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.fetch.max_concurrent, 8);
        assert_eq!(config.limits.max_bytes, 15 * 1024 * 1024);
        assert_eq!(config.limits.min_dimension, 100);
        assert_eq!(config.limits.max_width, 4000);
        assert_eq!(config.limits.max_height, 3000);
        assert_eq!(config.crawl.home_markers, vec!["home".to_string()]);
        assert_eq!(config.navigation.rules.len(), 1);
        assert_eq!(config.navigation.rules[0].action, RuleAction::Deny);
        assert!(config
            .media
            .noise_rules
            .iter()
            .any(|r| r.target == NoiseTarget::Context));
        assert!(config.output.summary_path.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let config_content = r#"
[crawl]
entry-url = "https://sites.example.com/view/guide/accueil?authuser=0"
scope = ["guide", "/view/"]
home-markers = ["accueil"]

[fetch]
max-concurrent = 6
request-delay-ms = 800
media-delay-ms = 250
request-timeout-secs = 60
user-agent = "TestAgent/1.0"
accept-language = "fr-FR,fr;q=0.9"

[[navigation.rule]]
name = "catalogue"
pattern = "catalogue"
action = "deny"

[[navigation.rule]]
name = "sections"
pattern = "police|ems|gang"
action = "allow"

[media]
image-hosts = ["cdn.example.net"]

[[media.noise-rule]]
name = "wallpaper"
pattern = "wallpaper"
target = "url"

[limits]
max-bytes = 1024
decode-dimensions = false

[output]
directory = "./images"
file-prefix = "guide_"
summary-path = "./report.md"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.fetch.max_concurrent, 6);
        assert_eq!(config.fetch.media_delay_ms, 250);
        assert_eq!(config.crawl.home_markers, vec!["accueil".to_string()]);
        assert_eq!(config.navigation.rules.len(), 2);
        assert_eq!(config.navigation.rules[1].action, RuleAction::Allow);
        assert_eq!(config.media.noise_rules.len(), 1);
        assert_eq!(config.media.image_hosts, vec!["cdn.example.net".to_string()]);
        // Unset media keys keep their defaults
        assert_eq!(config.media.section_markers, "header|banner|hero|cover");
        assert!(!config.limits.decode_dimensions);
        assert_eq!(config.limits.max_bytes, 1024);
        assert_eq!(config.output.file_prefix, "guide_");
        assert_eq!(config.output.summary_path.as_deref(), Some("./report.md"));
    }

    #[test]
    fn test_example_config_is_valid() {
        let config = parse_config(include_str!("../../harvest.example.toml")).unwrap();
        assert_eq!(config.crawl.home_markers.len(), 2);
        assert_eq!(config.media.noise_rules.len(), 6);
        assert_eq!(config.output.file_prefix, "flashback_");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawl]
entry-url = "https://sites.example.com/"
scope = ["sites.example.com"]

[fetch]
max-concurrent = 0

[output]
directory = "./harvest"
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
