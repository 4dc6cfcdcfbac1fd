//! services/showroom/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::Duration;
use showroom_core::store::{
    StoreOptions, DEFAULT_HISTORY_LIMIT, DEFAULT_IMAGE_CACHE_TTL_HOURS,
    DEFAULT_IMAGE_SEARCH_COUNT, DEFAULT_KEY_PREFIX,
};
use tracing::Level;

/// Unsplash caps `per_page` at 30.
const MAX_IMAGE_SEARCH_COUNT: usize = 30;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub log_level: Level,
    pub key_prefix: String,
    pub unsplash_access_key: Option<String>,
    pub unsplash_api_url: String,
    pub image_cache_ttl_hours: i64,
    pub image_search_count: usize,
    pub history_limit: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Storage ---
        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "sqlite:showroom.db?mode=rwc".to_string());
        if !database_url.starts_with("sqlite:") {
            return Err(ConfigError::InvalidValue(
                "DATABASE_URL".to_string(),
                format!("'{}' is not a sqlite URL", database_url),
            ));
        }
        let key_prefix =
            lookup("STORAGE_KEY_PREFIX").unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Image Search ---
        let unsplash_access_key = lookup("UNSPLASH_ACCESS_KEY").filter(|k| !k.trim().is_empty());
        let unsplash_api_url = lookup("UNSPLASH_API_URL")
            .unwrap_or_else(|| "https://api.unsplash.com".to_string())
            .trim_end_matches('/')
            .to_string();

        let image_cache_ttl_hours = parse_or(
            &lookup,
            "IMAGE_CACHE_TTL_HOURS",
            DEFAULT_IMAGE_CACHE_TTL_HOURS,
            |hours| *hours > 0,
        )?;
        let image_search_count = parse_or(
            &lookup,
            "IMAGE_SEARCH_COUNT",
            DEFAULT_IMAGE_SEARCH_COUNT,
            |count| (1..=MAX_IMAGE_SEARCH_COUNT).contains(count),
        )?;

        // --- Stores ---
        let history_limit =
            parse_or(&lookup, "HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT, |limit| *limit > 0)?;

        Ok(Self {
            database_url,
            log_level,
            key_prefix,
            unsplash_access_key,
            unsplash_api_url,
            image_cache_ttl_hours,
            image_search_count,
            history_limit,
        })
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            key_prefix: self.key_prefix.clone(),
            image_cache_ttl: Duration::hours(self.image_cache_ttl_hours),
            image_search_count: self.image_search_count,
            history_limit: self.history_limit,
        }
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
    valid: impl Fn(&T) -> bool,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + std::fmt::Display,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => Ok(value),
        Ok(value) => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("{} is out of range", value),
        )),
        Err(_) => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a number", raw),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_url, "sqlite:showroom.db?mode=rwc");
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.unsplash_access_key.is_none());

        let options = config.store_options();
        assert_eq!(options.key_prefix, "@car_showroom_");
        assert_eq!(options.image_cache_ttl, Duration::hours(24));
        assert_eq!(options.image_search_count, 5);
        assert_eq!(options.history_limit, 50);
    }

    #[test]
    fn overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("RUST_LOG", "debug"),
            ("UNSPLASH_ACCESS_KEY", "key"),
            ("UNSPLASH_API_URL", "http://localhost:9000/"),
            ("IMAGE_CACHE_TTL_HOURS", "6"),
            ("IMAGE_SEARCH_COUNT", "10"),
            ("HISTORY_LIMIT", "20"),
        ])
        .unwrap();
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.unsplash_access_key.as_deref(), Some("key"));
        assert_eq!(config.unsplash_api_url, "http://localhost:9000");
        assert_eq!(config.store_options().image_cache_ttl, Duration::hours(6));
        assert_eq!(config.history_limit, 20);
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            config_from(&[("RUST_LOG", "loud")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "RUST_LOG"
        ));
        assert!(matches!(
            config_from(&[("IMAGE_SEARCH_COUNT", "31")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "IMAGE_SEARCH_COUNT"
        ));
        assert!(matches!(
            config_from(&[("IMAGE_CACHE_TTL_HOURS", "soon")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "IMAGE_CACHE_TTL_HOURS"
        ));
        assert!(matches!(
            config_from(&[("DATABASE_URL", "postgres://localhost/db")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "DATABASE_URL"
        ));
    }
}
