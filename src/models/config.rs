//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Source;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the url -> signature state is persisted
    #[serde(default = "defaults::state_file")]
    pub state_file: PathBuf,

    /// Prefix placed in front of every alert message
    #[serde(default = "defaults::message_prefix")]
    pub message_prefix: String,

    /// Pages to watch, processed in this order
    #[serde(default)]
    pub sources: Vec<Source>,

    /// HTTP fetch behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// SMS provider settings
    #[serde(default)]
    pub sms: SmsConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Resolve the state file path. Relative paths are taken relative to
    /// the directory holding the config file.
    pub fn state_path(&self, config_path: &Path) -> PathBuf {
        if self.state_file.is_absolute() {
            return self.state_file.clone();
        }
        match config_path.parent() {
            Some(dir) => dir.join(&self.state_file),
            None => self.state_file.clone(),
        }
    }

    /// Validate global settings.
    ///
    /// Individual sources are not checked here: a bad source is skipped at
    /// run time without affecting the others.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_attempts == 0 {
            return Err(AppError::validation("fetch.max_attempts must be > 0"));
        }
        if self.sms.timeout_secs == 0 {
            return Err(AppError::validation("sms.timeout_secs must be > 0"));
        }
        Url::parse(&self.sms.endpoint).map_err(|e| {
            AppError::validation(format!("sms.endpoint '{}': {}", self.sms.endpoint, e))
        })?;
        Ok(())
    }

    /// Strictly check every source: valid http(s) url, usable kind, and no
    /// url used twice.
    pub fn validate_sources(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !seen.insert(source.url.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate source url '{}'",
                    source.url
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_file: defaults::state_file(),
            message_prefix: defaults::message_prefix(),
            sources: Vec::new(),
            fetch: FetchConfig::default(),
            sms: SmsConfig::default(),
        }
    }
}

/// HTTP fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::fetch_timeout")]
    pub timeout_secs: u64,

    /// Total attempts per source when requests time out
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Base retry delay; attempt `n` waits `n * backoff_secs`
    #[serde(default = "defaults::backoff")]
    pub backoff_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::fetch_timeout(),
            max_attempts: defaults::max_attempts(),
            backoff_secs: defaults::backoff(),
        }
    }
}

/// SMS provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    /// Provider endpoint accepting form-encoded messages
    #[serde(default = "defaults::sms_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::sms_timeout")]
    pub timeout_secs: u64,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::sms_endpoint(),
            timeout_secs: defaults::sms_timeout(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn state_file() -> PathBuf {
        PathBuf::from("state.json")
    }
    pub fn message_prefix() -> String {
        "Uppdatering upptäckt".into()
    }

    // Fetch defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
            .into()
    }
    pub fn fetch_timeout() -> u64 {
        90
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn backoff() -> u64 {
        5
    }

    // SMS defaults
    pub fn sms_endpoint() -> String {
        "https://api.46elks.com/a1/SMS".into()
    }
    pub fn sms_timeout() -> u64 {
        20
    }
}
