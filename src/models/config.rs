//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Wiki connection settings
    #[serde(default)]
    pub wiki: WikiConfig,

    /// Archival behaviour
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Bot data documents
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.wiki.user_agent.trim().is_empty() {
            return Err(AppError::validation("wiki.user_agent is empty"));
        }
        if self.wiki.timeout_secs == 0 {
            return Err(AppError::validation("wiki.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.wiki.api_url)?;
        url::Url::parse(&self.wiki.base_url)?;
        if self.archive.talk_namespace.trim().is_empty() {
            return Err(AppError::validation("archive.talk_namespace is empty"));
        }
        if !(-12..=14).contains(&self.archive.timezone_offset_hours) {
            return Err(AppError::validation(
                "archive.timezone_offset_hours must be between -12 and 14",
            ));
        }
        if self.archive.review_probe_days <= 0 {
            return Err(AppError::validation(
                "archive.review_probe_days must be > 0",
            ));
        }
        Ok(())
    }
}

/// Wiki API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    /// MediaWiki action API endpoint
    #[serde(default = "defaults::api_url")]
    pub api_url: String,

    /// Base URL that article titles are appended to
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Bot account name
    #[serde(default = "defaults::user")]
    pub user: String,

    /// Environment variable holding the bot password
    #[serde(default = "defaults::password_env")]
    pub password_env: String,

    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl WikiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the bot password from the configured environment variable.
    pub fn password(&self) -> Option<String> {
        std::env::var(&self.password_env)
            .ok()
            .filter(|p| !p.is_empty())
    }
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            api_url: defaults::api_url(),
            base_url: defaults::base_url(),
            user: defaults::user(),
            password_env: defaults::password_env(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Archival and review behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Pause between consecutive wiki writes
    #[serde(default = "defaults::edit_delay")]
    pub edit_delay_ms: u64,

    /// Offset added to "now" before computing nomination age
    #[serde(default = "defaults::timezone_offset")]
    pub timezone_offset_hours: i64,

    #[serde(default = "defaults::talk_namespace")]
    pub talk_namespace: String,

    /// Reviews older than this with open objections are put up for probation
    #[serde(default = "defaults::probe_days")]
    pub review_probe_days: i64,
}

impl ArchiveConfig {
    pub fn edit_delay(&self) -> Duration {
        Duration::from_millis(self.edit_delay_ms)
    }

    /// Talk page title of an article.
    pub fn talk_page(&self, article: &str) -> String {
        format!("{}:{}", self.talk_namespace, article)
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            edit_delay_ms: defaults::edit_delay(),
            timezone_offset_hours: defaults::timezone_offset(),
            talk_namespace: defaults::talk_namespace(),
            review_probe_days: defaults::probe_days(),
        }
    }
}

/// Locations of the JSON bot data documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "defaults::nomination_types")]
    pub nomination_types: PathBuf,

    #[serde(default = "defaults::signatures")]
    pub signatures: PathBuf,

    #[serde(default = "defaults::preferences")]
    pub preferences: PathBuf,

    #[serde(default = "defaults::projects")]
    pub projects: PathBuf,
}

impl PathsConfig {
    /// Resolve every path against a base directory.
    pub fn resolve(&self, base: &Path) -> Self {
        Self {
            nomination_types: base.join(&self.nomination_types),
            signatures: base.join(&self.signatures),
            preferences: base.join(&self.preferences),
            projects: base.join(&self.projects),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            nomination_types: defaults::nomination_types(),
            signatures: defaults::signatures(),
            preferences: defaults::preferences(),
            projects: defaults::projects(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "defaults::level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Wiki defaults
    pub fn api_url() -> String {
        "https://starwars.fandom.com/api.php".into()
    }
    pub fn base_url() -> String {
        "https://starwars.fandom.com/wiki/".into()
    }
    pub fn user() -> String {
        "ArchiverBot".into()
    }
    pub fn password_env() -> String {
        "ARCHIVER_PASSWORD".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; archiver/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Archive defaults
    pub fn edit_delay() -> u64 {
        1000
    }
    pub fn timezone_offset() -> i64 {
        2
    }
    pub fn talk_namespace() -> String {
        "Talk".into()
    }
    pub fn probe_days() -> i64 {
        30
    }

    // Data documents
    pub fn nomination_types() -> PathBuf {
        PathBuf::from("nom_types.json")
    }
    pub fn signatures() -> PathBuf {
        PathBuf::from("signatures.json")
    }
    pub fn preferences() -> PathBuf {
        PathBuf::from("preferences.json")
    }
    pub fn projects() -> PathBuf {
        PathBuf::from("projects.json")
    }

    pub fn level() -> String {
        "info".into()
    }
}
