//! Append-only CSV log of service requests

use crate::StoreError;
use chat311_domain::ServiceRequest;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Column order of every row; the file carries no header
pub const CSV_COLUMNS: [&str; 8] = [
    "complaint",
    "description",
    "category",
    "severity",
    "location",
    "latitude",
    "longitude",
    "created_at",
];

/// CSV file that only ever grows
#[derive(Debug, Clone)]
pub struct CsvLog {
    path: PathBuf,
}

impl CsvLog {
    /// Log to `path`, created on first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File this log appends to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row for `request`
    pub fn append(&self, request: &ServiceRequest) -> Result<(), StoreError> {
        let created_at = request.created_at_iso();
        let row = csv_row(&[
            request.complaint.as_str(),
            request.description.as_str(),
            request.category.as_str(),
            request.severity.as_str(),
            request.location.as_str(),
            request.latitude.as_deref().unwrap_or(""),
            request.longitude.as_deref().unwrap_or(""),
            created_at.as_str(),
        ]);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(row.as_bytes())?;
        Ok(())
    }
}

/// Render one RFC 4180 record, terminated by CRLF
///
/// Fields holding a comma, quote, CR or LF are quoted with inner quotes
/// doubled.
pub fn csv_row(fields: &[&str]) -> String {
    let mut row = fields
        .iter()
        .map(|field| {
            if field.contains([',', '"', '\r', '\n']) {
                format!("\"{}\"", field.replace('"', "\"\""))
            } else {
                field.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}
