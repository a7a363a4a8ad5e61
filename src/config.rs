use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "reqdb";
const CONFIG_FILE: &str = "config.json";
const DATABASE_FILE: &str = "reqdb.db";

/// Environment variable overriding [`Config::database_path`].
pub const DATABASE_ENV: &str = "REQDB_DATABASE";
/// Environment variable overriding [`Config::log_filter`].
pub const LOG_ENV: &str = "REQDB_LOG";

/// Runtime configuration, built once at startup and passed to whatever needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Location of the SQLite store. `:memory:` selects an ephemeral store.
    pub database_path: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
    /// Enable write-ahead logging on file stores.
    pub wal_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_filter: "reqdb=info".to_string(),
            wal_mode: true,
        }
    }
}

impl Config {
    /// Load configuration from the user's config directory, then apply
    /// environment overrides.
    /// Falls back to defaults if the file doesn't exist or fails to parse.
    pub fn load() -> Self {
        let config = match get_config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.with_env_overrides()
    }

    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(DATABASE_ENV).ok(),
            std::env::var(LOG_ENV).ok(),
        )
    }

    fn with_overrides(mut self, database: Option<String>, log: Option<String>) -> Self {
        if let Some(path) = database.filter(|p| !p.trim().is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(filter) = log.filter(|f| !f.trim().is_empty()) {
            self.log_filter = filter;
        }
        self
    }

    /// Save the configuration to the user's config directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }
}

/// Platform data directory for the store, or the working directory if none exists.
pub fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = Config {
            database_path: PathBuf::from("/tmp/reqdb-test.db"),
            log_filter: "reqdb=debug".to_string(),
            wal_mode: false,
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "wal_mode": false }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.wal_mode);
        assert_eq!(config.log_filter, "reqdb=info");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_overrides_replace_values() {
        let config = Config::default().with_overrides(
            Some(":memory:".to_string()),
            Some("reqdb=trace".to_string()),
        );
        assert_eq!(config.database_path, PathBuf::from(":memory:"));
        assert_eq!(config.log_filter, "reqdb=trace");
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let config = Config::default().with_overrides(Some("  ".to_string()), None);
        assert_eq!(config, Config::default());
    }
}
