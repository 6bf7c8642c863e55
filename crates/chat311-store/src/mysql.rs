//! MySQL-backed request store
//!
//! The connection requires TLS and verifies the server certificate against
//! the configured CA bundle (or the system roots).

use crate::StoreError;
use chat311_domain::ServiceRequest;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlSslMode};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS service_requests (
    id INTEGER AUTO_INCREMENT PRIMARY KEY,
    complaint TEXT,
    category TEXT,
    severity TEXT,
    description TEXT,
    location TEXT,
    latitude TEXT,
    longitude TEXT,
    created_at TEXT
)";

/// Connection parameters for the MySQL sink
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Server hostname
    pub hostname: String,
    /// Server port
    pub port: u16,
    /// Database (schema) name
    pub database: String,
    /// User name
    pub username: String,
    /// Password
    pub password: String,
    /// CA bundle used to verify the server certificate
    pub ssl_ca: Option<PathBuf>,
    /// How long to wait for a connection
    pub connect_timeout: Duration,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("ssl_ca", &self.ssl_ca)
            .finish_non_exhaustive()
    }
}

/// MySQL sink for service requests
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Prepare a pool without touching the network
    ///
    /// The first insert opens the connection and creates the table.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(&config.hostname)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database)
            .ssl_mode(MySqlSslMode::VerifyCa);
        if let Some(ca) = &config.ssl_ca {
            options = options.ssl_ca(ca);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(4)
            .acquire_timeout(config.connect_timeout)
            .connect_lazy_with(options);

        Self { pool }
    }

    /// Ensure the table exists and insert one row, returning its id
    pub async fn insert(&self, request: &ServiceRequest) -> Result<u64, StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;

        let result = sqlx::query(
            "INSERT INTO service_requests (complaint, category, severity, description, location, latitude, longitude, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.complaint)
        .bind(&request.category)
        .bind(&request.severity)
        .bind(&request.description)
        .bind(&request.location)
        .bind(&request.latitude)
        .bind(&request.longitude)
        .bind(request.created_at_iso())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }
}
