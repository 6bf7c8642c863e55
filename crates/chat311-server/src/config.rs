//! Configuration file parsing for the server.
//!
//! Non-secret settings only: bind address, pipeline behaviour, sinks and
//! endpoint URLs. Credentials come from [`crate::secrets`].

use chat311_builder::{BuilderConfig, CoordinateStrategy};
use chat311_geocode::here::DEFAULT_GEOCODE_URL;
use chat311_llm::openai::DEFAULT_BASE_URL;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listener settings
    pub server: ServerSettings,

    /// Pipeline settings
    pub builder: BuilderConfig,

    /// Where finished requests are written
    pub storage: StorageSettings,

    /// Service endpoints
    pub endpoints: EndpointSettings,
}

/// Listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8501)
    pub bind_port: u16,
}

/// Relational sink selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    /// No relational sink
    #[default]
    None,
    /// Local SQLite file at `sqlite_path`
    Sqlite,
    /// MySQL server named by the `CHAT311_*` secrets
    Mysql,
}

/// Sink settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Append every request to this CSV file
    pub csv_output: Option<PathBuf>,

    /// Relational sink
    pub database: DatabaseKind,

    /// SQLite database file
    pub sqlite_path: PathBuf,

    /// MySQL port
    pub mysql_port: u16,

    /// CA bundle for verifying the MySQL server certificate
    pub ssl_ca: Option<PathBuf>,
}

/// Service endpoints, overridable for testing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    /// OpenAI-compatible API base URL
    pub openai_base_url: String,

    /// HERE geocode endpoint
    pub geocode_url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8501,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            csv_output: None,
            database: DatabaseKind::default(),
            sqlite_path: PathBuf::from("chat311.db"),
            mysql_port: 3306,
            ssl_ca: None,
        }
    }
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.builder.validate().map_err(ConfigError::Invalid)
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.bind_port)
    }

    /// Whether the geocoding key is needed
    pub fn needs_geocoder(&self) -> bool {
        self.builder.coordinate_strategy == CoordinateStrategy::Geocoder
    }

    /// Whether the MySQL connection secrets are needed
    pub fn needs_mysql(&self) -> bool {
        self.storage.database == DatabaseKind::Mysql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8501");
        assert_eq!(config.storage.database, DatabaseKind::None);
        assert_eq!(config.endpoints.openai_base_url, DEFAULT_BASE_URL);
        assert!(config.needs_geocoder());
        assert!(!config.needs_mysql());
    }

    #[test]
    fn test_parse_toml() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            bind_address = "0.0.0.0"
            bind_port = 9000

            [builder]
            coordinate_strategy = "model"
            parallel_steps = true

            [storage]
            csv_output = "requests.csv"
            database = "mysql"
            ssl_ca = "/etc/ssl/cert.pem"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert!(config.builder.parallel_steps);
        assert!(!config.needs_geocoder());
        assert!(config.needs_mysql());
        assert_eq!(config.storage.csv_output, Some(PathBuf::from("requests.csv")));
        assert_eq!(config.storage.mysql_port, 3306);
    }

    #[test]
    fn test_storage_defaults_to_no_database() {
        assert_eq!(DatabaseKind::default(), DatabaseKind::None);
        let config = AppConfig::from_toml("[storage]\ncsv_output = \"out.csv\"\n").unwrap();
        assert_eq!(config.storage.database, DatabaseKind::None);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8501");
    }

    #[test]
    fn test_invalid_builder_section() {
        let result = AppConfig::from_toml("[builder]\ncontext_window = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_database_kind() {
        let result = AppConfig::from_toml("[storage]\ndatabase = \"oracle\"\n");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }
}
