//! SQLite-backed request store

use crate::StoreError;
use chat311_domain::traits::RequestStore;
use chat311_domain::ServiceRequest;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite implementation of RequestStore
///
/// SQLite connections are not thread-safe; share one behind a mutex.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the table exists
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    /// Number of stored requests
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM service_requests", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl RequestStore for SqliteStore {
    type Error = StoreError;

    fn insert(&mut self, request: &ServiceRequest) -> Result<i64, Self::Error> {
        self.conn.execute(
            "INSERT INTO service_requests (complaint, category, severity, description, location, latitude, longitude, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &request.complaint,
                &request.category,
                &request.severity,
                &request.description,
                &request.location,
                &request.latitude,
                &request.longitude,
                request.created_at_iso(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn recent(&self, limit: usize) -> Result<Vec<ServiceRequest>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT complaint, category, severity, description, location, latitude, longitude, created_at
             FROM service_requests ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(StoredRow {
                complaint: row.get(0)?,
                category: row.get(1)?,
                severity: row.get(2)?,
                description: row.get(3)?,
                location: row.get(4)?,
                latitude: row.get(5)?,
                longitude: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?.into_request()?);
        }
        Ok(requests)
    }
}

/// A row as read back, before timestamp parsing
struct StoredRow {
    complaint: String,
    category: String,
    severity: String,
    description: String,
    location: String,
    latitude: Option<String>,
    longitude: Option<String>,
    created_at: String,
}

impl StoredRow {
    fn into_request(self) -> Result<ServiceRequest, StoreError> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StoreError::InvalidData(format!("Bad created_at {:?}: {}", self.created_at, e)))?
            .with_timezone(&Utc);

        Ok(ServiceRequest {
            complaint: self.complaint,
            category: self.category,
            severity: self.severity,
            description: self.description,
            location: self.location,
            latitude: self.latitude,
            longitude: self.longitude,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let store = SqliteStore::open(":memory:").unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_schema_is_idempotent() {
        let store = SqliteStore::open(":memory:").unwrap();
        assert!(store.initialize_schema().is_ok());
    }
}
