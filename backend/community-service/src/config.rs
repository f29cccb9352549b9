/// Configuration management for Community Service
///
/// Loads configuration from environment variables. The binary loads a
/// `.env` file first; the library never touches the filesystem for config.
use anyhow::{anyhow, Context, Result};
use media_storage::{StorageConfig, COMPOSER_MAX_UPLOAD_BYTES};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Composer limits
    pub composer: ComposerConfig,
    /// Feed paging
    pub feed: FeedConfig,
    /// Mention rendering
    pub mentions: MentionsConfig,
    /// Upload storage
    pub storage: StorageConfig,
    /// Scheduled-post sweeper
    pub sweeper: SweeperConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Multi-image posts enabled (4 attachments instead of 1)
    pub gallery_enabled: bool,
    pub max_upload_bytes: usize,
    /// Minimum distance between submission and scheduled publication
    pub min_schedule_lead_secs: i64,
    /// Offset applied to schedule times submitted without a zone
    pub local_utc_offset_minutes: i32,
    /// Reject unrecognized mode/action values instead of defaulting
    pub strict_enums: bool,
}

impl ComposerConfig {
    pub fn max_attachments(&self) -> usize {
        if self.gallery_enabled {
            GALLERY_MAX_ATTACHMENTS
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionsConfig {
    /// Profile link prefix, the username is appended
    pub profile_url_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    pub interval_secs: u64,
}

/// Attachment ceiling when the gallery is enabled
pub const GALLERY_MAX_ATTACHMENTS: usize = 4;

// Default values
fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            gallery_enabled: true,
            max_upload_bytes: COMPOSER_MAX_UPLOAD_BYTES,
            min_schedule_lead_secs: 5 * 60,
            local_utc_offset_minutes: 60,
            strict_enums: false,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 50,
        }
    }
}

impl Default for MentionsConfig {
    fn default() -> Self {
        Self {
            profile_url_prefix: "/utente/".to_string(),
        }
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL environment variable not set")?,
            max_connections: parse_env("DB_MAX_CONNECTIONS")?
                .unwrap_or_else(default_max_connections),
            min_connections: parse_env("DB_MIN_CONNECTIONS")?
                .unwrap_or_else(default_min_connections),
        };

        let composer_defaults = ComposerConfig::default();
        let composer = ComposerConfig {
            gallery_enabled: parse_env("COMPOSER_GALLERY_ENABLED")?
                .unwrap_or(composer_defaults.gallery_enabled),
            max_upload_bytes: parse_env("COMPOSER_MAX_UPLOAD_BYTES")?
                .unwrap_or(composer_defaults.max_upload_bytes),
            min_schedule_lead_secs: composer_defaults.min_schedule_lead_secs,
            local_utc_offset_minutes: parse_env("COMPOSER_UTC_OFFSET_MINUTES")?
                .unwrap_or(composer_defaults.local_utc_offset_minutes),
            strict_enums: parse_env("COMPOSER_STRICT_ENUMS")?
                .unwrap_or(composer_defaults.strict_enums),
        };

        if composer.local_utc_offset_minutes.abs() >= 24 * 60 {
            return Err(anyhow!(
                "COMPOSER_UTC_OFFSET_MINUTES out of range: {}",
                composer.local_utc_offset_minutes
            ));
        }

        let feed_defaults = FeedConfig::default();
        let feed = FeedConfig {
            default_limit: parse_env("FEED_DEFAULT_LIMIT")?
                .unwrap_or(feed_defaults.default_limit)
                .clamp(1, feed_defaults.max_limit),
            max_limit: feed_defaults.max_limit,
        };

        let mentions = MentionsConfig {
            profile_url_prefix: std::env::var("MENTIONS_PROFILE_URL_PREFIX")
                .unwrap_or_else(|_| MentionsConfig::default().profile_url_prefix),
        };

        let storage = StorageConfig::from_env().map_err(|e| anyhow!(e))?;

        let sweeper = SweeperConfig {
            interval_secs: parse_env("SWEEPER_INTERVAL_SECS")?
                .unwrap_or(SweeperConfig::default().interval_secs)
                .max(1),
        };

        Ok(Config {
            app,
            database,
            composer,
            feed,
            mentions,
            storage,
            sweeper,
        })
    }
}

fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        std::env::set_var("DATABASE_URL", "postgres://test");

        let config = Config::from_env().unwrap();

        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.min_connections, 2);
        assert!(config.composer.gallery_enabled);
        assert_eq!(config.composer.max_attachments(), 4);
        assert_eq!(config.composer.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.composer.min_schedule_lead_secs, 300);
        assert_eq!(config.feed.max_limit, 50);
        assert_eq!(config.sweeper.interval_secs, 60);
    }

    #[test]
    fn test_single_attachment_without_gallery() {
        let composer = ComposerConfig {
            gallery_enabled: false,
            ..ComposerConfig::default()
        };
        assert_eq!(composer.max_attachments(), 1);
    }
}
