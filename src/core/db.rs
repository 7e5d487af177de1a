use crate::core::error;
use crate::core::schemas;
use rusqlite::Connection;
use std::fs;
use std::path::Path;

pub fn db_connect(db_path: &Path) -> Result<Connection, error::MigrateError> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(error::MigrateError::IoError)?;
    }
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(error::MigrateError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::MigrateError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(error::MigrateError::RusqliteError)?;
    Ok(conn)
}

/// Create all nine destination tables. Safe to run repeatedly.
pub fn initialize_destination_db(conn: &Connection) -> Result<(), error::MigrateError> {
    for (_, ddl) in schemas::SQLITE_SCHEMA {
        conn.execute(ddl, [])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_is_idempotent_and_enables_fks() {
        let tmp = tempfile::tempdir().unwrap();
        let conn = db_connect(&tmp.path().join("nested/kanban.db")).unwrap();
        initialize_destination_db(&conn).unwrap();
        initialize_destination_db(&conn).unwrap();

        let fk_on: i64 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_on, 1);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 9);
    }
}
