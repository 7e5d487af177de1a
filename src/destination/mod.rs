//! Destination access: the only capabilities the migration needs from a
//! backend.
//!
//! - `upsert`: insert-or-overwrite rows on a conflict key
//! - `count`: exact row count of a table
//! - `read_one`: read at most one row (presence check)
//! - `probe`: cheap connectivity check
//!
//! Every pipeline stage takes `&mut dyn Destination`, so the hosted REST
//! backend, a local SQLite file and the in-memory fake are interchangeable.

pub mod memory;
pub mod rest;
pub mod sqlite;

use crate::core::config::DestinationConfig;
use crate::core::error::MigrateError;
use serde_json::Value as JsonValue;

pub use memory::MemoryDestination;
pub use rest::RestDestination;
pub use sqlite::SqliteDestination;

pub trait Destination {
    /// Display label (URL or file path), never credentials.
    fn label(&self) -> String;

    fn probe(&mut self) -> Result<(), MigrateError>;

    /// Insert each record, or overwrite the existing row whose
    /// `conflict_key` column matches. Records are JSON objects.
    fn upsert(
        &mut self,
        table: &str,
        records: &[JsonValue],
        conflict_key: &str,
    ) -> Result<(), MigrateError>;

    fn count(&mut self, table: &str) -> Result<u64, MigrateError>;

    /// Up to one row of `table`. An error means the table is unreachable.
    fn read_one(&mut self, table: &str) -> Result<Vec<JsonValue>, MigrateError>;
}

/// Open the destination described by the config.
pub fn open(config: &DestinationConfig) -> Result<Box<dyn Destination>, MigrateError> {
    match config {
        DestinationConfig::Rest {
            url,
            service_key,
            timeout,
        } => Ok(Box::new(RestDestination::new(url, service_key, *timeout)?)),
        DestinationConfig::Sqlite { path } => Ok(Box::new(SqliteDestination::open(path)?)),
    }
}

/// Table and column names end up in URLs and SQL text; only plain
/// identifiers are accepted.
pub(crate) fn validate_identifier(name: &str) -> Result<&str, MigrateError> {
    let mut chars = name.chars();
    let ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(name)
    } else {
        Err(MigrateError::ValidationError(format!(
            "invalid identifier: '{}'",
            name
        )))
    }
}
