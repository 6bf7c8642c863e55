//! Chat311 Server
//!
//! Web front end for the request pipeline: a single-field complaint form,
//! a JSON API and a health check. Wires configuration and secrets into the
//! completion provider, geocoder and persistence sinks.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod page;
pub mod secrets;

use chat311_builder::RequestBuilder;
use chat311_geocode::HereGeocoder;
use chat311_llm::OpenAiProvider;
use chat311_store::{CsvLog, DatabaseConfig, MySqlStore, Persistence, SqliteStore};
use config::{AppConfig, DatabaseKind};
use handlers::{create_router, AppState};
use secrets::Secrets;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Completion provider could not be created
    #[error("Completion provider error: {0}")]
    Provider(#[from] chat311_llm::LlmError),

    /// Geocoder could not be created
    #[error("Geocoder error: {0}")]
    Geocoder(#[from] chat311_geocode::GeocodeError),

    /// A persistence sink could not be opened
    #[error("Storage error: {0}")]
    Storage(#[from] chat311_store::StoreError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Assemble application state from configuration and secrets
///
/// Without secrets the pipeline is left out and submissions answer
/// `ConfigurationUnavailable`; sinks that need no credentials still open.
pub fn build_state(
    config: &AppConfig,
    secrets: Option<&Secrets>,
) -> Result<AppState<OpenAiProvider>, ServerError> {
    let builder = match secrets {
        Some(secrets) => Some(Arc::new(build_pipeline(config, secrets)?)),
        None => {
            warn!("No usable secrets; submissions will be rejected");
            None
        }
    };

    let persistence = build_persistence(config, secrets)?;

    Ok(AppState {
        builder,
        persistence: Arc::new(persistence),
    })
}

fn build_pipeline(
    config: &AppConfig,
    secrets: &Secrets,
) -> Result<RequestBuilder<OpenAiProvider>, ServerError> {
    let api_key = secrets
        .get(secrets::OPENAI_API_KEY)
        .ok_or_else(|| ServerError::Server(format!("{} is not set", secrets::OPENAI_API_KEY)))?;

    let mut provider = OpenAiProvider::new(
        api_key,
        config.builder.model.clone(),
        config.builder.request_timeout(),
    )?
    .with_base_url(config.endpoints.openai_base_url.clone());
    if let Some(temperature) = config.builder.temperature {
        provider = provider.with_temperature(temperature);
    }
    info!("Completion model: {}", provider.model());

    let mut builder = RequestBuilder::new(provider, config.builder.clone());

    if config.needs_geocoder() {
        match secrets.get(secrets::HERE_API_KEY) {
            Some(key) => {
                let geocoder = HereGeocoder::new(key, config.builder.request_timeout())?
                    .with_url(config.endpoints.geocode_url.clone());
                builder = builder.with_geocoder(geocoder);
            }
            None => warn!("{} is not set; coordinates will be omitted", secrets::HERE_API_KEY),
        }
    }

    Ok(builder)
}

fn build_persistence(config: &AppConfig, secrets: Option<&Secrets>) -> Result<Persistence, ServerError> {
    let mut persistence = Persistence::new();

    if let Some(path) = &config.storage.csv_output {
        info!("Appending requests to {}", path.display());
        persistence = persistence.with_csv(CsvLog::new(path.clone()));
    }

    match config.storage.database {
        DatabaseKind::None => {}
        DatabaseKind::Sqlite => {
            info!("Storing requests in SQLite at {}", config.storage.sqlite_path.display());
            persistence = persistence.with_sqlite(SqliteStore::open(&config.storage.sqlite_path)?);
        }
        DatabaseKind::Mysql => match secrets.and_then(|s| mysql_config(config, s)) {
            Some(db) => {
                info!("Storing requests in MySQL database {} on {}", db.database, db.hostname);
                persistence = persistence.with_mysql(MySqlStore::connect_lazy(&db));
            }
            None => warn!("MySQL connection secrets missing; requests will not be stored"),
        },
    }

    Ok(persistence)
}

fn mysql_config(config: &AppConfig, secrets: &Secrets) -> Option<DatabaseConfig> {
    Some(DatabaseConfig {
        hostname: secrets.get(secrets::CHAT311_HOSTNAME)?.to_string(),
        port: config.storage.mysql_port,
        database: secrets.get(secrets::CHAT311_DATABASE)?.to_string(),
        username: secrets.get(secrets::CHAT311_USERNAME)?.to_string(),
        password: secrets.get(secrets::CHAT311_PASSWORD)?.to_string(),
        ssl_ca: config.storage.ssl_ca.clone(),
        connect_timeout: config.builder.request_timeout(),
    })
}

/// Start the HTTP server
pub async fn start_server(config: AppConfig, secrets: Option<Secrets>) -> Result<(), ServerError> {
    info!("Starting Chat311");
    info!("Bind address: {}", config.bind_addr());
    info!("Coordinate strategy: {:?}", config.builder.coordinate_strategy);

    let state = build_state(&config, secrets.as_ref())?;
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Chat311 listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn secrets(pairs: &[(&str, &str)]) -> Secrets {
        let table: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let required: Vec<&'static str> = vec![secrets::OPENAI_API_KEY];
        Secrets::load_from(Some(&table), &required, |_| None).unwrap()
    }

    #[test]
    fn test_build_state_without_secrets() {
        let state = build_state(&AppConfig::default(), None).unwrap();
        assert!(state.builder.is_none());
        assert!(!state.persistence.is_enabled());
    }

    #[test]
    fn test_build_state_with_secrets_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.csv_output = Some(dir.path().join("out.csv"));

        let s = secrets(&[(secrets::OPENAI_API_KEY, "sk-test"), (secrets::HERE_API_KEY, "here")]);
        let state = build_state(&config, Some(&s)).unwrap();

        assert!(state.builder.is_some());
        assert!(state.persistence.is_enabled());
    }

    #[test]
    fn test_build_state_opens_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.database = DatabaseKind::Sqlite;
        config.storage.sqlite_path = dir.path().join("chat311.db");

        let state = build_state(&config, None).unwrap();
        assert!(state.persistence.is_enabled());
        assert!(config.storage.sqlite_path.exists());
    }

    #[test]
    fn test_mysql_without_secrets_is_skipped() {
        let mut config = AppConfig::default();
        config.storage.database = DatabaseKind::Mysql;

        let s = secrets(&[(secrets::OPENAI_API_KEY, "sk-test")]);
        let state = build_state(&config, Some(&s)).unwrap();
        assert!(!state.persistence.is_enabled());
    }

    #[test]
    fn test_mysql_config_from_secrets() {
        let mut config = AppConfig::default();
        config.storage.mysql_port = 3307;
        let s = secrets(&[
            (secrets::OPENAI_API_KEY, "sk-test"),
            (secrets::CHAT311_HOSTNAME, "db.example.com"),
            (secrets::CHAT311_DATABASE, "chat311"),
            (secrets::CHAT311_USERNAME, "app"),
            (secrets::CHAT311_PASSWORD, "pw"),
        ]);

        let db = mysql_config(&config, &s).unwrap();
        assert_eq!(db.hostname, "db.example.com");
        assert_eq!(db.port, 3307);
        assert_eq!(db.password, "pw");
    }
}
