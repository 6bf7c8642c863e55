//! Chat311 Storage Layer
//!
//! Write-only sinks for service requests:
//!
//! - `CsvLog`: append-only CSV file, one row per request
//! - `SqliteStore`: local SQLite table (implements `RequestStore`)
//! - `MySqlStore`: hosted MySQL table over a CA-verified TLS connection
//!
//! `Persistence` bundles the configured sinks behind one call.
//!
//! # Examples
//!
//! ```no_run
//! use chat311_store::{CsvLog, Persistence, SqliteStore};
//!
//! let persistence = Persistence::new()
//!     .with_csv(CsvLog::new("requests.csv"))
//!     .with_sqlite(SqliteStore::open("chat311.db").unwrap());
//! assert!(persistence.is_enabled());
//! ```

#![warn(missing_docs)]

mod csv_log;
mod mysql;
mod sqlite;

use chat311_domain::traits::RequestStore;
use chat311_domain::ServiceRequest;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info};

pub use csv_log::{csv_row, CsvLog, CSV_COLUMNS};
pub use mysql::{DatabaseConfig, MySqlStore};
pub use sqlite::SqliteStore;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// MySQL error
    #[error("MySQL error: {0}")]
    MySql(#[from] sqlx::Error),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be read back
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A blocking write task did not finish
    #[error("Task join error: {0}")]
    Task(String),
}

/// Relational sink selected by configuration
pub enum Database {
    /// Local SQLite file
    Sqlite(Arc<Mutex<SqliteStore>>),
    /// Hosted MySQL server
    MySql(MySqlStore),
}

/// The configured set of sinks for completed requests
#[derive(Default)]
pub struct Persistence {
    csv: Option<CsvLog>,
    database: Option<Database>,
}

impl Persistence {
    /// Persistence that writes nowhere
    pub fn new() -> Self {
        Self::default()
    }

    /// Also append every request to a CSV file
    pub fn with_csv(mut self, csv: CsvLog) -> Self {
        self.csv = Some(csv);
        self
    }

    /// Also insert every request into a SQLite table
    pub fn with_sqlite(mut self, store: SqliteStore) -> Self {
        self.database = Some(Database::Sqlite(Arc::new(Mutex::new(store))));
        self
    }

    /// Also insert every request into a MySQL table
    pub fn with_mysql(mut self, store: MySqlStore) -> Self {
        self.database = Some(Database::MySql(store));
        self
    }

    /// Whether any sink is configured
    pub fn is_enabled(&self) -> bool {
        self.csv.is_some() || self.database.is_some()
    }

    /// Write a request to every configured sink
    ///
    /// CSV first, then the database. Stops at the first failure.
    pub async fn persist(&self, request: &ServiceRequest) -> Result<(), StoreError> {
        if let Some(csv) = &self.csv {
            csv.append(request)?;
            debug!("Appended request to {}", csv.path().display());
        }

        match &self.database {
            Some(Database::Sqlite(store)) => {
                // rusqlite blocks; keep it off the async workers
                let store = Arc::clone(store);
                let request = request.clone();
                let id = tokio::task::spawn_blocking(move || insert_sqlite(&store, &request))
                    .await
                    .map_err(|e| StoreError::Task(e.to_string()))??;
                info!("Stored service request {} in SQLite", id);
            }
            Some(Database::MySql(store)) => {
                let id = store.insert(request).await?;
                info!("Stored service request {} in MySQL", id);
            }
            None => {}
        }

        Ok(())
    }
}

fn insert_sqlite(store: &Mutex<SqliteStore>, request: &ServiceRequest) -> Result<i64, StoreError> {
    let mut store = store
        .lock()
        .map_err(|e| StoreError::InvalidData(format!("Store lock error: {}", e)))?;
    store.insert(request)
}
