//! Crawler configuration
//!
//! Configuration comes from built-in defaults matching the live Fakebook
//! deployment, optionally overridden by a TOML file and by CLI flags.

use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Hostname to connect to (also sent as the Host header)
    #[serde(default = "default_host")]
    pub host: String,

    /// TLS port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path fetched anonymously to obtain the initial session cookie
    #[serde(default = "default_root_path")]
    pub root_path: String,

    /// Prefix an href must contain to be considered in crawl scope;
    /// also the authenticated landing page
    #[serde(default = "default_scope_prefix")]
    pub scope_prefix: String,

    /// Path of the login form
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// User-Agent header value sent on GET requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrawlerConfig {
    /// Number of distinct flags that terminates the crawl
    #[serde(default = "default_flag_quota")]
    pub flag_quota: usize,

    /// Per-recv read timeout in milliseconds (0 disables)
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Consecutive connection-level failures after which the crawl stops
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

fn default_host() -> String {
    "project2.5700.network".to_string()
}

fn default_port() -> u16 {
    443
}

fn default_root_path() -> String {
    "/".to_string()
}

fn default_scope_prefix() -> String {
    "/fakebook/".to_string()
}

fn default_login_path() -> String {
    "/accounts/login/?next=/fakebook/".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/111.0.0.0 Safari/537.36"
        .to_string()
}

fn default_flag_quota() -> usize {
    5
}

fn default_read_timeout_ms() -> u64 {
    10_000
}

fn default_max_consecutive_failures() -> u32 {
    3
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            root_path: default_root_path(),
            scope_prefix: default_scope_prefix(),
            login_path: default_login_path(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            flag_quota: default_flag_quota(),
            read_timeout_ms: default_read_timeout_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

/// Loads and validates configuration from a TOML file
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Parsed and validated configuration
/// * `Err(ConfigError)` - Read, parse, or validation failure
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates a configuration, whether loaded or assembled from the CLI
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    if config.site.host.is_empty() {
        return Err(ConfigError::Validation("site.host must not be empty".into()));
    }
    if config.site.port == 0 {
        return Err(ConfigError::Validation("site.port must be non-zero".into()));
    }
    for (name, path) in [
        ("site.root_path", &config.site.root_path),
        ("site.scope_prefix", &config.site.scope_prefix),
        ("site.login_path", &config.site.login_path),
    ] {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "{} must be an absolute path (got {:?})",
                name, path
            )));
        }
    }
    if config.crawler.flag_quota == 0 {
        return Err(ConfigError::Validation(
            "crawler.flag_quota must be at least 1".into(),
        ));
    }
    if config.crawler.max_consecutive_failures == 0 {
        return Err(ConfigError::Validation(
            "crawler.max_consecutive_failures must be at least 1".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.site.port, 443);
        assert_eq!(config.crawler.flag_quota, 5);
        assert_eq!(config.site.scope_prefix, "/fakebook/");
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [site]
            host = "example.test"

            [crawler]
            flag_quota = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.site.host, "example.test");
        assert_eq!(config.crawler.flag_quota, 2);
        // Untouched fields keep their defaults
        assert_eq!(config.site.login_path, "/accounts/login/?next=/fakebook/");
        assert_eq!(config.crawler.max_consecutive_failures, 3);
    }

    #[test]
    fn test_rejects_empty_host() {
        let mut config = Config::default();
        config.site.host.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_relative_path() {
        let mut config = Config::default();
        config.site.login_path = "accounts/login/".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_quota() {
        let mut config = Config::default();
        config.crawler.flag_quota = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_unknown_field() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
            [site]
            hostname = "typo.test"
            "#,
        );
        assert!(result.is_err());
    }
}
