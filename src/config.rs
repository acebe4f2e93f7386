//! Configuration management for quotekeeper.
//!
//! This module handles loading and saving configuration to/from a JSON file.
//! The config directory can be customized.
//!
//! Includes sync-related configuration:
//! - endpoint: remote quote source
//! - interval_secs: how often the periodic sync runs
//! - auto_resolve: conflict policy applied by unattended syncs

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QuoteError, QuoteResult};
use crate::reconcile::ResolutionPolicy;
use crate::transfer::DEFAULT_EXPORT_FILE_NAME;

/// Placeholder endpoint used as the remote quote source
pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Category given to every record fetched from the remote source
    #[serde(default = "default_remote_category")]
    pub remote_category: String,
    /// Policy for conflicts found by unattended syncs (None leaves them pending)
    #[serde(default)]
    pub auto_resolve: Option<ResolutionPolicy>,
}

fn default_true() -> bool {
    true
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_interval_secs() -> u64 {
    60
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_remote_category() -> String {
    "Server".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            endpoint: default_endpoint(),
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
            remote_category: default_remote_category(),
            auto_resolve: None,
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigData {
    /// Path to the key-value database file
    #[serde(default)]
    pub database_file: String,
    /// File name offered for exports
    #[serde(default = "default_export_file_name")]
    pub export_file_name: String,
    /// Sync configuration
    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_export_file_name() -> String {
    DEFAULT_EXPORT_FILE_NAME.to_string()
}

fn default_database_file(config_dir: &Path) -> String {
    config_dir.join("quotes.db").to_string_lossy().to_string()
}

impl ConfigData {
    fn with_database_in(config_dir: &Path) -> Self {
        Self {
            database_file: default_database_file(config_dir),
            export_file_name: default_export_file_name(),
            sync: SyncConfig::default(),
        }
    }
}

/// Configuration manager
pub struct Config {
    config_dir: PathBuf,
    config_file: PathBuf,
    data: ConfigData,
}

impl Config {
    /// Create a new configuration manager
    ///
    /// Without the `desktop` feature, `config_dir` is required.
    pub fn new(config_dir: Option<PathBuf>) -> QuoteResult<Self> {
        let config_dir = match config_dir {
            Some(dir) => dir,
            None => {
                #[cfg(feature = "desktop")]
                {
                    dirs::config_dir()
                        .unwrap_or_else(|| PathBuf::from("."))
                        .join("quotekeeper")
                }
                #[cfg(not(feature = "desktop"))]
                {
                    return Err(QuoteError::Config(
                        "config_dir is required without the desktop feature".to_string(),
                    ));
                }
            }
        };

        fs::create_dir_all(&config_dir)?;
        let config_file = config_dir.join("config.json");

        // Missing, unreadable or incomplete files are rewritten with the
        // effective settings.
        let (mut data, mut needs_save) = match fs::read_to_string(&config_file) {
            Ok(content) => match serde_json::from_str::<ConfigData>(&content) {
                Ok(data) => (data, false),
                Err(e) => {
                    tracing::warn!("Replacing unreadable config {}: {}", config_file.display(), e);
                    (ConfigData::with_database_in(&config_dir), true)
                }
            },
            Err(_) => (ConfigData::with_database_in(&config_dir), true),
        };

        if data.database_file.trim().is_empty() {
            data.database_file = default_database_file(&config_dir);
            needs_save = true;
        }

        let config = Self {
            config_dir,
            config_file,
            data,
        };

        if needs_save {
            config.save()?;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> QuoteResult<()> {
        let content = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.config_file, content)?;
        Ok(())
    }

    /// Get the configuration directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get the database file path
    pub fn database_file(&self) -> &str {
        &self.data.database_file
    }

    /// Get the export file name
    pub fn export_file_name(&self) -> &str {
        &self.data.export_file_name
    }

    /// Get sync configuration
    pub fn sync_config(&self) -> &SyncConfig {
        &self.data.sync
    }

    /// Check if sync is enabled
    pub fn is_sync_enabled(&self) -> bool {
        self.data.sync.enabled
    }

    /// Enable or disable sync
    pub fn set_sync_enabled(&mut self, enabled: bool) -> QuoteResult<()> {
        self.data.sync.enabled = enabled;
        self.save()
    }

    /// Set the remote endpoint
    pub fn set_endpoint(&mut self, endpoint: &str) -> QuoteResult<()> {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(QuoteError::validation("endpoint", "must be an http(s) URL"));
        }
        self.data.sync.endpoint = endpoint.to_string();
        self.save()
    }

    /// Set the periodic sync interval
    pub fn set_interval_secs(&mut self, secs: u64) -> QuoteResult<()> {
        if secs == 0 {
            return Err(QuoteError::validation("interval_secs", "must be positive"));
        }
        self.data.sync.interval_secs = secs;
        self.save()
    }

    /// Set the policy applied by unattended syncs
    pub fn set_auto_resolve(&mut self, policy: Option<ResolutionPolicy>) -> QuoteResult<()> {
        self.data.sync.auto_resolve = policy;
        self.save()
    }

    /// Get a configuration value
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "database_file" => Some(self.data.database_file.clone()),
            "export_file_name" => Some(self.data.export_file_name.clone()),
            "endpoint" => Some(self.data.sync.endpoint.clone()),
            "interval_secs" => Some(self.data.sync.interval_secs.to_string()),
            "remote_category" => Some(self.data.sync.remote_category.clone()),
            "auto_resolve" => self.data.sync.auto_resolve.map(|p| p.as_str().to_string()),
            _ => None,
        }
    }

    /// Set a configuration value
    pub fn set(&mut self, key: &str, value: &str) -> QuoteResult<()> {
        match key {
            "database_file" => self.data.database_file = value.to_string(),
            "export_file_name" => self.data.export_file_name = value.to_string(),
            "endpoint" => return self.set_endpoint(value),
            "interval_secs" => {
                let secs = value
                    .parse()
                    .map_err(|_| QuoteError::validation("interval_secs", "must be an integer"))?;
                return self.set_interval_secs(secs);
            }
            "remote_category" => self.data.sync.remote_category = value.to_string(),
            "auto_resolve" => {
                let policy = match value {
                    "" | "none" => None,
                    other => Some(other.parse()?),
                };
                return self.set_auto_resolve(policy);
            }
            _ => return Err(QuoteError::Config(format!("Unknown config key: {}", key))),
        }
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::new(Some(temp_dir.path().to_path_buf())).unwrap();

        assert!(config.is_sync_enabled());
        assert_eq!(config.sync_config().endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.sync_config().interval(), Duration::from_secs(60));
        assert_eq!(config.sync_config().remote_category, "Server");
        assert!(config.sync_config().auto_resolve.is_none());
        assert_eq!(config.export_file_name(), "quotes.json");
        assert!(config.database_file().ends_with("quotes.db"));
        assert!(temp_dir.path().join("config.json").exists());
    }

    #[test]
    fn test_config_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut config = Config::new(Some(temp_dir.path().to_path_buf())).unwrap();
            config.set_endpoint("http://127.0.0.1:9000/posts").unwrap();
            config.set_auto_resolve(Some(ResolutionPolicy::Both)).unwrap();
            config.set_sync_enabled(false).unwrap();
        }

        {
            let config = Config::new(Some(temp_dir.path().to_path_buf())).unwrap();
            assert_eq!(config.sync_config().endpoint, "http://127.0.0.1:9000/posts");
            assert_eq!(config.sync_config().auto_resolve, Some(ResolutionPolicy::Both));
            assert!(!config.is_sync_enabled());
        }
    }

    #[test]
    fn test_corrupt_config_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("config.json"), "{ nope").unwrap();

        let config = Config::new(Some(temp_dir.path().to_path_buf())).unwrap();
        assert_eq!(config.sync_config().interval_secs, 60);

        let written = fs::read_to_string(temp_dir.path().join("config.json")).unwrap();
        let reloaded: ConfigData = serde_json::from_str(&written).unwrap();
        assert_eq!(reloaded.database_file, config.database_file());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("config.json"),
            r#"{"sync": {"interval_secs": 5, "auto_resolve": "server"}}"#,
        )
        .unwrap();

        let config = Config::new(Some(temp_dir.path().to_path_buf())).unwrap();
        assert_eq!(config.sync_config().interval_secs, 5);
        assert_eq!(config.sync_config().auto_resolve, Some(ResolutionPolicy::Server));
        assert_eq!(config.sync_config().timeout_secs, 30);
        assert_eq!(
            config.database_file(),
            temp_dir.path().join("quotes.db").to_string_lossy()
        );

        let written = fs::read_to_string(temp_dir.path().join("config.json")).unwrap();
        let reloaded: ConfigData = serde_json::from_str(&written).unwrap();
        assert_eq!(reloaded.database_file, config.database_file());
        assert_eq!(reloaded.sync.interval_secs, 5);
    }

    #[test]
    fn test_get_set() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::new(Some(temp_dir.path().to_path_buf())).unwrap();

        config.set("interval_secs", "120").unwrap();
        assert_eq!(config.get("interval_secs"), Some("120".to_string()));

        config.set("auto_resolve", "keep_local").unwrap();
        assert_eq!(config.get("auto_resolve"), Some("local".to_string()));
        config.set("auto_resolve", "none").unwrap();
        assert!(config.get("auto_resolve").is_none());

        assert!(config.set("interval_secs", "0").is_err());
        assert!(config.set("endpoint", "ftp://example.com").is_err());
        assert!(config.set("unknown", "x").is_err());
    }
}
