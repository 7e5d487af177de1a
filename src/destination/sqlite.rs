//! Direct relational destination backed by a local SQLite file.
//!
//! Same table and column names as the hosted schema. Array/object values are
//! stored as JSON text and decoded again by `read_one`.

use crate::core::db;
use crate::core::error::MigrateError;
use crate::destination::{Destination, validate_identifier};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, params_from_iter};
use serde_json::{Map, Value as JsonValue};
use std::path::{Path, PathBuf};

pub struct SqliteDestination {
    conn: Connection,
    path: PathBuf,
}

impl SqliteDestination {
    /// Open (or create) the database file. Tables are not created here; see
    /// `initialize`.
    pub fn open(path: &Path) -> Result<Self, MigrateError> {
        let conn = db::db_connect(path)?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Create the nine destination tables if they are missing.
    pub fn initialize(&self) -> Result<(), MigrateError> {
        db::initialize_destination_db(&self.conn)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Destination for SqliteDestination {
    fn label(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }

    fn probe(&mut self) -> Result<(), MigrateError> {
        self.conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    fn upsert(
        &mut self,
        table: &str,
        records: &[JsonValue],
        conflict_key: &str,
    ) -> Result<(), MigrateError> {
        let table = validate_identifier(table)?;
        let conflict_key = validate_identifier(conflict_key)?;

        let tx = self.conn.transaction()?;
        for record in records {
            let Some(obj) = record.as_object() else {
                return Err(MigrateError::ValidationError(format!(
                    "{}: record is not a JSON object",
                    table
                )));
            };
            if !obj.contains_key(conflict_key) {
                return Err(MigrateError::ValidationError(format!(
                    "{}: record has no '{}' column",
                    table, conflict_key
                )));
            }

            let columns = obj
                .keys()
                .map(|k| validate_identifier(k).map(|c| format!("\"{}\"", c)))
                .collect::<Result<Vec<_>, _>>()?;
            let placeholders = (1..=columns.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>();
            let updates = columns
                .iter()
                .filter(|c| c.trim_matches('"') != conflict_key)
                .map(|c| format!("{c} = excluded.{c}"))
                .collect::<Vec<_>>();

            let conflict_action = if updates.is_empty() {
                "DO NOTHING".to_string()
            } else {
                format!("DO UPDATE SET {}", updates.join(", "))
            };
            let sql = format!(
                "INSERT INTO \"{}\" ({}) VALUES ({}) ON CONFLICT(\"{}\") {}",
                table,
                columns.join(", "),
                placeholders.join(", "),
                conflict_key,
                conflict_action
            );

            let mut stmt = tx.prepare_cached(&sql)?;
            stmt.execute(params_from_iter(obj.values().map(json_to_sql)))?;
        }
        tx.commit()?;
        Ok(())
    }

    fn count(&mut self, table: &str) -> Result<u64, MigrateError> {
        let table = validate_identifier(table)?;
        let n: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", table),
            [],
            |row| row.get(0),
        )?;
        Ok(n.max(0) as u64)
    }

    fn read_one(&mut self, table: &str) -> Result<Vec<JsonValue>, MigrateError> {
        let table = validate_identifier(table)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM \"{}\" LIMIT 1", table))?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let mut rows = stmt.query([])?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut obj = Map::new();
            for (i, name) in names.iter().enumerate() {
                obj.insert(name.clone(), sql_to_json(row.get_ref(i)?));
            }
            out.push(JsonValue::Object(obj));
        }
        Ok(out)
    }
}

fn json_to_sql(value: &JsonValue) -> SqlValue {
    match value {
        JsonValue::Null => SqlValue::Null,
        JsonValue::Bool(b) => SqlValue::Integer(i64::from(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        JsonValue::String(s) => SqlValue::Text(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => SqlValue::Text(value.to_string()),
    }
}

fn sql_to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(i) => JsonValue::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            let trimmed = text.trim_start();
            // Collection columns were written as JSON text.
            if trimmed.starts_with('[') || trimmed.starts_with('{') {
                if let Ok(parsed) = serde_json::from_str(&text) {
                    return parsed;
                }
            }
            JsonValue::String(text.into_owned())
        }
        ValueRef::Blob(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}
