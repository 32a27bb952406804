//! Configuration management
//!
//! Where the learning context lives, how much history summaries show, and
//! the default log filter.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::learning::RECENT_GOALS_PER_CATEGORY;

/// File name used when no context file is configured
pub const DEFAULT_CONTEXT_FILE: &str = "learning_context.json";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Context file location
    #[serde(default)]
    pub storage: StorageConfig,
    /// Category summary settings
    #[serde(default)]
    pub summary: SummaryConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the learning context (defaults to the data directory)
    #[serde(default)]
    pub context_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Completed goals listed per category
    #[serde(default = "default_recent_goals")]
    pub recent_goals: usize,
}

fn default_recent_goals() -> usize {
    RECENT_GOALS_PER_CATEGORY
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            recent_goals: default_recent_goals(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a file, creating it with defaults if missing
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Load configuration, falling back to defaults when it is unusable.
    ///
    /// The error is handed back so the caller can report it once logging is up.
    pub fn load_or_default() -> (Self, Option<anyhow::Error>) {
        match config_path() {
            Ok(path) => Self::load_or_default_from(&path),
            Err(e) => (Config::default(), Some(e)),
        }
    }

    /// Same as [`Config::load_or_default`] for an explicit file
    pub fn load_or_default_from(path: &Path) -> (Self, Option<anyhow::Error>) {
        match Self::load_or_create(path) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Context file to use, preferring an explicit override
    pub fn context_path(&self, override_path: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = override_path {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = &self.storage.context_file {
            return Ok(path.clone());
        }
        Ok(data_dir()?.join(DEFAULT_CONTEXT_FILE))
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "wardbuddy", "wardbuddy")
        .context("Failed to get project directories")
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    let context_file = config.context_path(None)?;

    println!("{}", crate::info());
    println!("Configuration ({})", config_path()?.display());
    println!("  context file:   {}", context_file.display());
    println!("  recent goals:   {}", config.summary.recent_goals);
    println!("  log level:      {}", config.logging.level);

    Ok(())
}

/// Reset configuration to defaults
pub fn reset_config() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.summary.recent_goals, 3);
        assert_eq!(config.logging.level, "warn");
        assert!(config.storage.context_file.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[storage]\ncontext_file = \"/tmp/ctx.json\"\n").unwrap();
        assert_eq!(config.storage.context_file, Some(PathBuf::from("/tmp/ctx.json")));
        assert_eq!(config.summary, SummaryConfig::default());
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.toml");
        let mut config = Config::default();
        config.summary.recent_goals = 5;
        config.logging.level = "debug".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_context_path_precedence() {
        let mut config = Config::default();
        config.storage.context_file = Some(PathBuf::from("/data/configured.json"));

        let explicit = config.context_path(Some(Path::new("/data/explicit.json"))).unwrap();
        assert_eq!(explicit, PathBuf::from("/data/explicit.json"));
        assert_eq!(config.context_path(None).unwrap(), PathBuf::from("/data/configured.json"));
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[summary\nrecent_goals = ").unwrap();

        let (config, problem) = Config::load_or_default_from(&path);
        assert_eq!(config, Config::default());
        assert!(problem.is_some());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[summary\nrecent_goals = ");
    }

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let (config, problem) = Config::load_or_default_from(&path);
        assert!(problem.is_none());
        assert_eq!(config, Config::default());
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }
}
