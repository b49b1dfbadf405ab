//! Persistent library configuration model and defaults.

use std::path::{Path, PathBuf};

use log::info;

use crate::error::ConfigError;

const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;

/// Root configuration persisted to `library.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LibraryConfig {
    #[serde(default)]
    /// Library database location and locking behavior.
    pub database: DatabaseConfig,
    #[serde(default)]
    /// Log output preferences for the maintenance binary.
    pub logging: LoggingConfig,
}

/// Library database preferences.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DatabaseConfig {
    /// Database file. Empty means `<data_dir>/roqtune/library.db`.
    #[serde(default)]
    pub path: String,
    /// How long a statement waits on a conflicting writer before failing busy.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

/// Logger verbosity.
#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl DatabaseConfig {
    /// Resolves the configured database file, falling back to the user data directory.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if !self.path.trim().is_empty() {
            return Some(PathBuf::from(self.path.trim()));
        }
        dirs::data_dir().map(|dir| dir.join("roqtune").join("library.db"))
    }
}

/// Clamps values that would make the store unusable.
pub fn sanitize_config(mut config: LibraryConfig) -> LibraryConfig {
    config.database.busy_timeout_ms = config.database.busy_timeout_ms.min(MAX_BUSY_TIMEOUT_MS);
    config.database.path = config.database.path.trim().to_string();
    config
}

/// Default location of `library.toml`.
pub fn default_config_file() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("roqtune").join("library.toml"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Loads the config file, writing a default one first when it does not exist.
pub fn load_or_create(config_file: &Path) -> Result<LibraryConfig, ConfigError> {
    if !config_file.exists() {
        if let Some(parent) = config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!(
            "Config file not found. Creating default config. path={}",
            config_file.display()
        );
        let default_config = sanitize_config(LibraryConfig::default());
        std::fs::write(config_file, toml::to_string(&default_config)?)?;
        return Ok(default_config);
    }

    let config_content = std::fs::read_to_string(config_file)?;
    Ok(sanitize_config(toml::from_str::<LibraryConfig>(
        &config_content,
    )?))
}

#[cfg(test)]
mod tests {
    use super::{load_or_create, sanitize_config, LibraryConfig, LogLevel};

    #[test]
    fn test_default_config_has_expected_values() {
        let config = LibraryConfig::default();

        assert!(config.database.path.is_empty());
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_partial_config_deserialization_fills_defaults() {
        let partial_toml = r#"
[database]
path = "/tmp/library.db"
"#;

        let parsed: LibraryConfig = toml::from_str(partial_toml).expect("config should parse");
        assert_eq!(parsed.database.path, "/tmp/library.db");
        assert_eq!(parsed.database.busy_timeout_ms, 5_000);
        assert_eq!(parsed.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_log_level_parses_snake_case() {
        let parsed: LibraryConfig =
            toml::from_str("[logging]\nlevel = \"debug\"\n").expect("config should parse");
        assert_eq!(parsed.logging.level, LogLevel::Debug);
        assert_eq!(
            parsed.logging.level.to_level_filter(),
            log::LevelFilter::Debug
        );
    }

    #[test]
    fn test_sanitize_config_clamps_busy_timeout_and_trims_path() {
        let mut config = LibraryConfig::default();
        config.database.busy_timeout_ms = 3_600_000;
        config.database.path = "  /music/library.db ".to_string();

        let sanitized = sanitize_config(config);
        assert_eq!(sanitized.database.busy_timeout_ms, 60_000);
        assert_eq!(sanitized.database.path, "/music/library.db");
    }

    #[test]
    fn test_explicit_database_path_wins_over_data_dir() {
        let mut config = LibraryConfig::default();
        config.database.path = "/music/library.db".to_string();
        assert_eq!(
            config.database.resolved_path(),
            Some(std::path::PathBuf::from("/music/library.db"))
        );
    }

    #[test]
    fn test_load_or_create_writes_default_file_then_reads_it_back() {
        let temp_dir = tempfile::tempdir().expect("temp dir should be created");
        let config_file = temp_dir.path().join("nested").join("library.toml");

        let created = load_or_create(&config_file).expect("default config should be written");
        assert!(config_file.exists());
        assert_eq!(created, LibraryConfig::default());

        std::fs::write(
            &config_file,
            "[database]\nbusy_timeout_ms = 250\n[logging]\nlevel = \"warn\"\n",
        )
        .expect("config should be rewritten");
        let loaded = load_or_create(&config_file).expect("config should load");
        assert_eq!(loaded.database.busy_timeout_ms, 250);
        assert_eq!(loaded.logging.level, LogLevel::Warn);
    }
}
