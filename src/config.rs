//! Persistent tool configuration model and defaults.

use log::LevelFilter;

use crate::metadata::DEFAULT_COMMENT_LANGUAGE;

/// Root configuration persisted to `config.toml`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    /// One of `error`, `warn`, `info`, `debug`, `trace`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// How files are tagged.
    #[serde(default)]
    pub tagging: TaggingConfig,
    /// Catalog service access.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Tag-writing preferences.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct TaggingConfig {
    /// Also store a newly resolved genre in the genre frame, not only in the comment.
    /// Existing genre frames are never overwritten.
    #[serde(default)]
    pub write_genre_tag: bool,
    /// ISO 639-2 language of the comment frame that is read and written.
    #[serde(default = "default_comment_language")]
    pub comment_language: String,
}

/// Catalog service credentials and request behavior.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub client_id: String,
    /// Plain-text fallback when the secret is neither in the environment nor the keyring.
    #[serde(default)]
    pub client_secret: String,
    /// Consecutive rate-limit responses tolerated for one lookup.
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,
    /// Minimum spacing between catalog requests; 0 disables pacing.
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Optional ISO 3166-1 alpha-2 market passed to track search.
    #[serde(default)]
    pub market: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            tagging: TaggingConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            write_genre_tag: false,
            comment_language: default_comment_language(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
            min_request_interval_ms: default_min_request_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            market: String::new(),
        }
    }
}

impl Config {
    /// Log level filter for `log_level`, `Info` for unknown values.
    pub fn log_level_filter(&self) -> LevelFilter {
        parse_log_level(&self.log_level).unwrap_or(LevelFilter::Info)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_comment_language() -> String {
    DEFAULT_COMMENT_LANGUAGE.to_string()
}

fn default_max_rate_limit_retries() -> u32 {
    16
}

fn default_min_request_interval_ms() -> u64 {
    100
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn parse_log_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

fn sanitize_comment_language(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.len() == 3 && trimmed.chars().all(|ch| ch.is_ascii_alphabetic()) {
        trimmed.to_ascii_lowercase()
    } else {
        default_comment_language()
    }
}

/// Clamps loaded values into the ranges the rest of the tool relies on.
pub fn sanitize_config(config: Config) -> Config {
    let log_level = match parse_log_level(&config.log_level) {
        Some(_) => config.log_level.trim().to_ascii_lowercase(),
        None => default_log_level(),
    };

    Config {
        log_level,
        tagging: TaggingConfig {
            write_genre_tag: config.tagging.write_genre_tag,
            comment_language: sanitize_comment_language(&config.tagging.comment_language),
        },
        catalog: CatalogConfig {
            client_id: config.catalog.client_id.trim().to_string(),
            client_secret: config.catalog.client_secret.trim().to_string(),
            max_rate_limit_retries: config.catalog.max_rate_limit_retries.max(1),
            min_request_interval_ms: config.catalog.min_request_interval_ms.min(60_000),
            request_timeout_secs: config.catalog.request_timeout_secs.clamp(1, 300),
            market: config.catalog.market.trim().to_ascii_uppercase(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{sanitize_config, Config};
    use log::LevelFilter;

    #[test]
    fn test_default_config_has_expected_values() {
        let config = Config::default();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_level_filter(), LevelFilter::Info);
        assert!(!config.tagging.write_genre_tag);
        assert_eq!(config.tagging.comment_language, "eng");
        assert!(config.catalog.client_id.is_empty());
        assert!(config.catalog.client_secret.is_empty());
        assert_eq!(config.catalog.max_rate_limit_retries, 16);
        assert_eq!(config.catalog.min_request_interval_ms, 100);
        assert_eq!(config.catalog.request_timeout_secs, 15);
        assert!(config.catalog.market.is_empty());
    }

    #[test]
    fn test_partial_config_deserialization_fills_defaults() {
        let partial = r#"
[tagging]
write_genre_tag = true

[catalog]
client_id = "abc123"
"#;

        let parsed: Config = toml::from_str(partial).expect("config should parse");
        assert_eq!(parsed.log_level, "info");
        assert!(parsed.tagging.write_genre_tag);
        assert_eq!(parsed.tagging.comment_language, "eng");
        assert_eq!(parsed.catalog.client_id, "abc123");
        assert_eq!(parsed.catalog.max_rate_limit_retries, 16);
    }

    #[test]
    fn test_empty_config_deserializes_to_default() {
        let parsed: Config = toml::from_str("").expect("empty config should parse");
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let text = toml::to_string(&Config::default()).expect("config should serialize");
        let parsed: Config = toml::from_str(&text).expect("serialized config should parse");
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_sanitize_config_clamps_out_of_range_values() {
        let mut config = Config::default();
        config.log_level = "LOUD".to_string();
        config.tagging.comment_language = "english".to_string();
        config.catalog.client_id = "  id  ".to_string();
        config.catalog.max_rate_limit_retries = 0;
        config.catalog.request_timeout_secs = 0;
        config.catalog.market = " se ".to_string();

        let sanitized = sanitize_config(config);
        assert_eq!(sanitized.log_level, "info");
        assert_eq!(sanitized.tagging.comment_language, "eng");
        assert_eq!(sanitized.catalog.client_id, "id");
        assert_eq!(sanitized.catalog.max_rate_limit_retries, 1);
        assert_eq!(sanitized.catalog.request_timeout_secs, 1);
        assert_eq!(sanitized.catalog.market, "SE");
    }

    #[test]
    fn test_sanitize_config_keeps_valid_values() {
        let mut config = Config::default();
        config.log_level = " Debug ".to_string();
        config.tagging.comment_language = "DEU".to_string();

        let sanitized = sanitize_config(config);
        assert_eq!(sanitized.log_level, "debug");
        assert_eq!(sanitized.log_level_filter(), LevelFilter::Debug);
        assert_eq!(sanitized.tagging.comment_language, "deu");
    }
}
