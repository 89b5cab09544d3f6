//! Configuration loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (handled by each binary's clap definition)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! Binaries parse their CLI flags, then call [`Config::load`] and overlay
//! any explicit flags on top of the result.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::queue::{QueueConfig, TRANSLATION_QUEUE_NAME};

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://omniversetv.db?mode=rwc";
pub const DEFAULT_PROVIDER_URL: &str = "https://api-free.deepl.com/v2/translate";

/// Shared configuration for both backend services.
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub database_url: String,
    /// Translation provider endpoint (DeepL-compatible).
    pub provider_url: String,
    /// Provider API key; required by the worker, unused by the catalog service.
    pub provider_api_key: Option<String>,
    pub queue_max_attempts: u32,
    pub queue_backoff_base_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            provider_api_key: None,
            queue_max_attempts: 3,
            queue_backoff_base_secs: 5,
        }
    }
}

/// On-disk representation; every field optional so a config file only has to
/// name what it overrides.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    redis_url: Option<String>,
    database_url: Option<String>,
    provider_url: Option<String>,
    provider_api_key: Option<String>,
    queue_max_attempts: Option<u32>,
    queue_backoff_base_secs: Option<u64>,
}

impl Config {
    /// Load configuration, overlaying file and environment onto defaults.
    ///
    /// `file` is an explicit config path; when absent the default locations
    /// are probed (`~/.config/omniversetv/config.toml`, then
    /// `/etc/omniversetv/config.toml`).
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = file.map(Path::to_path_buf).or_else(default_config_file) {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse {}: {}", path.display(), e))
            })?;
            config.apply_file(file_config);
        }

        config.apply_env();
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(v) = file.redis_url {
            self.redis_url = v;
        }
        if let Some(v) = file.database_url {
            self.database_url = v;
        }
        if let Some(v) = file.provider_url {
            self.provider_url = v;
        }
        if file.provider_api_key.is_some() {
            self.provider_api_key = file.provider_api_key;
        }
        if let Some(v) = file.queue_max_attempts {
            self.queue_max_attempts = v;
        }
        if let Some(v) = file.queue_backoff_base_secs {
            self.queue_backoff_base_secs = v;
        }
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("OTV_REDIS_URL") {
            self.redis_url = v;
        }
        if let Ok(v) = std::env::var("OTV_DATABASE_URL") {
            self.database_url = v;
        }
        if let Ok(v) = std::env::var("DEEPL_API_URL") {
            self.provider_url = v;
        }
        if let Ok(v) = std::env::var("DEEPL_API_KEY") {
            self.provider_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("OTV_QUEUE_MAX_ATTEMPTS") {
            if let Ok(n) = v.parse() {
                self.queue_max_attempts = n;
            }
        }
        if let Ok(v) = std::env::var("OTV_QUEUE_BACKOFF_SECS") {
            if let Ok(n) = v.parse() {
                self.queue_backoff_base_secs = n;
            }
        }
    }

    /// Queue configuration derived from the shared settings.
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            name: TRANSLATION_QUEUE_NAME.to_string(),
            max_attempts: self.queue_max_attempts,
            backoff_base: Duration::from_secs(self.queue_backoff_base_secs),
        }
    }
}

/// First existing default config file, if any.
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("omniversetv").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/omniversetv/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}
