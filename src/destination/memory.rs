//! In-memory destination with call recording and failure injection.
//!
//! Behaves like the hosted store for the four capabilities (rows keyed by
//! the conflict column, missing tables are errors) so pipeline behaviour can
//! be asserted without a network or a file.

use crate::core::error::MigrateError;
use crate::core::schemas;
use crate::destination::Destination;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap, HashSet};

/// One `upsert` invocation as seen by the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertCall {
    pub table: String,
    pub records: usize,
    pub conflict_key: String,
    pub succeeded: bool,
}

#[derive(Debug, Default)]
pub struct MemoryDestination {
    tables: BTreeMap<String, BTreeMap<String, JsonValue>>,
    calls: Vec<UpsertCall>,
    calls_per_table: HashMap<String, usize>,
    failing_calls: HashMap<(String, usize), String>,
    failing_tables: HashMap<String, String>,
    unreachable: Option<String>,
    reads: HashSet<String>,
}

impl MemoryDestination {
    /// A destination where all nine tables exist and are empty.
    pub fn new() -> Self {
        Self::with_tables(&schemas::ALL_TABLES)
    }

    pub fn with_tables(tables: &[&str]) -> Self {
        let mut dest = Self::default();
        for t in tables {
            dest.tables.insert(t.to_string(), BTreeMap::new());
        }
        dest
    }

    /// Make the `nth` (1-based) upsert into `table` fail.
    pub fn fail_upsert_call(&mut self, table: &str, nth: usize, message: &str) {
        self.failing_calls
            .insert((table.to_string(), nth), message.to_string());
    }

    /// Make every upsert into `table` fail.
    pub fn fail_table(&mut self, table: &str, message: &str) {
        self.failing_tables
            .insert(table.to_string(), message.to_string());
    }

    pub fn drop_table(&mut self, table: &str) {
        self.tables.remove(table);
    }

    /// Make the probe fail, as if the backend could not be reached.
    pub fn set_unreachable(&mut self, message: &str) {
        self.unreachable = Some(message.to_string());
    }

    pub fn calls(&self) -> &[UpsertCall] {
        &self.calls
    }

    pub fn calls_for(&self, table: &str) -> Vec<&UpsertCall> {
        self.calls.iter().filter(|c| c.table == table).collect()
    }

    /// Rows of `table` ordered by id; empty for a missing table.
    pub fn rows(&self, table: &str) -> Vec<&JsonValue> {
        self.tables
            .get(table)
            .map(|rows| rows.values().collect())
            .unwrap_or_default()
    }

    pub fn row(&self, table: &str, id: &str) -> Option<&JsonValue> {
        self.tables.get(table).and_then(|rows| rows.get(id))
    }

    /// Tables that were read through `read_one` or `count`.
    pub fn was_read(&self, table: &str) -> bool {
        self.reads.contains(table)
    }

    fn missing(table: &str) -> MigrateError {
        MigrateError::DestinationError(format!(
            "relation \"public.{}\" does not exist",
            table
        ))
    }

    fn upsert_inner(
        &mut self,
        table: &str,
        records: &[JsonValue],
        conflict_key: &str,
        nth: usize,
    ) -> Result<(), MigrateError> {
        if let Some(msg) = self.failing_tables.get(table) {
            return Err(MigrateError::DestinationError(msg.clone()));
        }
        if let Some(msg) = self.failing_calls.get(&(table.to_string(), nth)) {
            return Err(MigrateError::DestinationError(msg.clone()));
        }
        let Some(rows) = self.tables.get_mut(table) else {
            return Err(Self::missing(table));
        };

        // Validate the whole batch first so a rejected call writes nothing.
        let mut keyed = Vec::with_capacity(records.len());
        for record in records {
            let key = match record.get(conflict_key) {
                Some(JsonValue::String(s)) => s.clone(),
                Some(JsonValue::Null) | None => {
                    return Err(MigrateError::DestinationError(format!(
                        "null value in column \"{}\" of relation \"{}\"",
                        conflict_key, table
                    )));
                }
                Some(other) => other.to_string(),
            };
            keyed.push((key, record.clone()));
        }
        for (key, record) in keyed {
            rows.insert(key, record);
        }
        Ok(())
    }
}

impl Destination for MemoryDestination {
    fn label(&self) -> String {
        "memory://".to_string()
    }

    fn probe(&mut self) -> Result<(), MigrateError> {
        match &self.unreachable {
            Some(msg) => Err(MigrateError::DestinationError(msg.clone())),
            None => Ok(()),
        }
    }

    fn upsert(
        &mut self,
        table: &str,
        records: &[JsonValue],
        conflict_key: &str,
    ) -> Result<(), MigrateError> {
        let nth = {
            let n = self.calls_per_table.entry(table.to_string()).or_insert(0);
            *n += 1;
            *n
        };
        let result = self.upsert_inner(table, records, conflict_key, nth);
        self.calls.push(UpsertCall {
            table: table.to_string(),
            records: records.len(),
            conflict_key: conflict_key.to_string(),
            succeeded: result.is_ok(),
        });
        result
    }

    fn count(&mut self, table: &str) -> Result<u64, MigrateError> {
        self.reads.insert(table.to_string());
        self.tables
            .get(table)
            .map(|rows| rows.len() as u64)
            .ok_or_else(|| Self::missing(table))
    }

    fn read_one(&mut self, table: &str) -> Result<Vec<JsonValue>, MigrateError> {
        self.reads.insert(table.to_string());
        self.tables
            .get(table)
            .map(|rows| rows.values().take(1).cloned().collect())
            .ok_or_else(|| Self::missing(table))
    }
}
