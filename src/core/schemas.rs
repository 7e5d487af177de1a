//! Destination table definitions.
//!
//! The V2 backend has nine tables, all keyed by a text `id`. The Postgres
//! script is what operators paste into the hosted SQL editor; the SQLite
//! statements back the local destination and keep the same column names.
//! Collection-valued columns are JSONB in Postgres and JSON text in SQLite.

pub const CLIENTS: &str = "clients";
pub const PROJECTS: &str = "projects";
pub const TASKS: &str = "tasks";
pub const ACTIVITY_LOG: &str = "activity_log";
pub const PROGRESS_LOGS: &str = "progress_logs";
pub const SCHEDULE: &str = "schedule";
pub const REVENUE: &str = "revenue";
pub const ANALYTICS: &str = "analytics";
pub const ACHIEVEMENTS: &str = "achievements";

/// All destination tables in pipeline order.
pub const ALL_TABLES: [&str; 9] = [
    CLIENTS,
    PROJECTS,
    TASKS,
    ACTIVITY_LOG,
    PROGRESS_LOGS,
    SCHEDULE,
    REVENUE,
    ANALYTICS,
    ACHIEVEMENTS,
];

/// Conflict key shared by every table.
pub const CONFLICT_KEY: &str = "id";

/// Fixed id of the analytics and achievements rows.
pub const SINGLETON_ID: &str = "singleton";

pub const SQLITE_SCHEMA_CLIENTS: &str = "
    CREATE TABLE IF NOT EXISTS clients (
        id TEXT PRIMARY KEY,
        name TEXT,
        email TEXT NOT NULL DEFAULT '',
        phone TEXT NOT NULL DEFAULT '',
        company TEXT NOT NULL DEFAULT '',
        rate REAL NOT NULL DEFAULT 0,
        rate_type TEXT NOT NULL DEFAULT 'project',
        status TEXT NOT NULL DEFAULT 'active',
        notes TEXT NOT NULL DEFAULT '',
        tags TEXT NOT NULL DEFAULT '[]',
        contacts TEXT NOT NULL DEFAULT '[]',
        locations TEXT NOT NULL DEFAULT '[]',
        total_revenue REAL NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
";

pub const SQLITE_SCHEMA_PROJECTS: &str = "
    CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        client_id TEXT REFERENCES clients(id) ON DELETE CASCADE,
        name TEXT,
        description TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'active',
        value REAL NOT NULL DEFAULT 0,
        currency TEXT NOT NULL DEFAULT 'AUD',
        deadline TEXT,
        location_id TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
";

pub const SQLITE_SCHEMA_TASKS: &str = "
    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        title TEXT,
        description TEXT NOT NULL DEFAULT '',
        priority TEXT NOT NULL DEFAULT 'medium',
        status TEXT NOT NULL DEFAULT 'todo',
        assignee TEXT NOT NULL DEFAULT 'Brandon',
        estimated_minutes REAL,
        deadline TEXT,
        subtasks TEXT NOT NULL DEFAULT '[]',
        tags TEXT NOT NULL DEFAULT '',
        client_id TEXT,
        project_id TEXT,
        calendar_event_id TEXT,
        scheduled_start TEXT,
        scheduled_end TEXT,
        time_tracked REAL NOT NULL DEFAULT 0,
        time_sessions TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        completed_at TEXT
    )
";

pub const SQLITE_SCHEMA_ACTIVITY_LOG: &str = "
    CREATE TABLE IF NOT EXISTS activity_log (
        id TEXT PRIMARY KEY,
        type TEXT,
        description TEXT,
        metadata TEXT NOT NULL DEFAULT '{}',
        timestamp TEXT
    )
";

pub const SQLITE_SCHEMA_PROGRESS_LOGS: &str = "
    CREATE TABLE IF NOT EXISTS progress_logs (
        id TEXT PRIMARY KEY,
        task_id TEXT,
        task_title TEXT,
        status TEXT,
        comment TEXT NOT NULL DEFAULT '',
        actual_minutes REAL,
        timestamp TEXT
    )
";

pub const SQLITE_SCHEMA_SCHEDULE: &str = "
    CREATE TABLE IF NOT EXISTS schedule (
        id TEXT PRIMARY KEY,
        task_id TEXT,
        task_title TEXT,
        start_time TEXT,
        end_time TEXT,
        created_at TEXT NOT NULL
    )
";

pub const SQLITE_SCHEMA_REVENUE: &str = "
    CREATE TABLE IF NOT EXISTS revenue (
        id TEXT PRIMARY KEY,
        client_id TEXT,
        client_name TEXT,
        project_id TEXT,
        project_name TEXT,
        amount REAL,
        month TEXT,
        year TEXT,
        date TEXT,
        notes TEXT NOT NULL DEFAULT '',
        type TEXT NOT NULL DEFAULT 'project'
    )
";

pub const SQLITE_SCHEMA_ANALYTICS: &str = "
    CREATE TABLE IF NOT EXISTS analytics (
        id TEXT PRIMARY KEY,
        total_tasks_completed REAL NOT NULL DEFAULT 0,
        average_completion_time REAL NOT NULL DEFAULT 0,
        on_time_completion_rate REAL NOT NULL DEFAULT 0,
        productivity_by_hour TEXT NOT NULL DEFAULT '{}',
        priority_distribution TEXT NOT NULL DEFAULT '{}',
        last_updated TEXT NOT NULL
    )
";

pub const SQLITE_SCHEMA_ACHIEVEMENTS: &str = "
    CREATE TABLE IF NOT EXISTS achievements (
        id TEXT PRIMARY KEY,
        total_points REAL NOT NULL DEFAULT 0,
        level REAL NOT NULL DEFAULT 1,
        unlocked TEXT NOT NULL DEFAULT '[]',
        last_updated TEXT NOT NULL
    )
";

/// SQLite DDL in creation order (clients before projects for the FK).
pub const SQLITE_SCHEMA: [(&str, &str); 9] = [
    (CLIENTS, SQLITE_SCHEMA_CLIENTS),
    (PROJECTS, SQLITE_SCHEMA_PROJECTS),
    (TASKS, SQLITE_SCHEMA_TASKS),
    (ACTIVITY_LOG, SQLITE_SCHEMA_ACTIVITY_LOG),
    (PROGRESS_LOGS, SQLITE_SCHEMA_PROGRESS_LOGS),
    (SCHEDULE, SQLITE_SCHEMA_SCHEDULE),
    (REVENUE, SQLITE_SCHEMA_REVENUE),
    (ANALYTICS, SQLITE_SCHEMA_ANALYTICS),
    (ACHIEVEMENTS, SQLITE_SCHEMA_ACHIEVEMENTS),
];

/// `schema.sql` for the hosted Postgres backend.
pub const POSTGRES_SCHEMA: &str = r#"-- Kanban V2 schema
-- Paste into the Supabase SQL editor and run once.

CREATE TABLE IF NOT EXISTS clients (
    id TEXT PRIMARY KEY,
    name TEXT,
    email TEXT NOT NULL DEFAULT '',
    phone TEXT NOT NULL DEFAULT '',
    company TEXT NOT NULL DEFAULT '',
    rate NUMERIC NOT NULL DEFAULT 0,
    rate_type TEXT NOT NULL DEFAULT 'project',
    status TEXT NOT NULL DEFAULT 'active',
    notes TEXT NOT NULL DEFAULT '',
    tags JSONB NOT NULL DEFAULT '[]'::jsonb,
    contacts JSONB NOT NULL DEFAULT '[]'::jsonb,
    locations JSONB NOT NULL DEFAULT '[]'::jsonb,
    total_revenue NUMERIC NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    client_id TEXT REFERENCES clients(id) ON DELETE CASCADE,
    name TEXT,
    description TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'active',
    value NUMERIC NOT NULL DEFAULT 0,
    currency TEXT NOT NULL DEFAULT 'AUD',
    deadline TEXT,
    location_id TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_projects_client ON projects(client_id);

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    title TEXT,
    description TEXT NOT NULL DEFAULT '',
    priority TEXT NOT NULL DEFAULT 'medium',
    status TEXT NOT NULL DEFAULT 'todo',
    assignee TEXT NOT NULL DEFAULT 'Brandon',
    estimated_minutes NUMERIC,
    deadline TEXT,
    subtasks JSONB NOT NULL DEFAULT '[]'::jsonb,
    tags JSONB NOT NULL DEFAULT '""'::jsonb,
    client_id TEXT,
    project_id TEXT,
    calendar_event_id TEXT,
    scheduled_start TEXT,
    scheduled_end TEXT,
    time_tracked NUMERIC NOT NULL DEFAULT 0,
    time_sessions JSONB NOT NULL DEFAULT '[]'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    completed_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);

CREATE TABLE IF NOT EXISTS activity_log (
    id TEXT PRIMARY KEY,
    type TEXT,
    description TEXT,
    metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
    timestamp TEXT
);

CREATE TABLE IF NOT EXISTS progress_logs (
    id TEXT PRIMARY KEY,
    task_id TEXT,
    task_title TEXT,
    status TEXT,
    comment TEXT NOT NULL DEFAULT '',
    actual_minutes NUMERIC,
    timestamp TEXT
);

CREATE TABLE IF NOT EXISTS schedule (
    id TEXT PRIMARY KEY,
    task_id TEXT,
    task_title TEXT,
    start_time TEXT,
    end_time TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS revenue (
    id TEXT PRIMARY KEY,
    client_id TEXT,
    client_name TEXT,
    project_id TEXT,
    project_name TEXT,
    amount NUMERIC,
    month JSONB,
    year JSONB,
    date TEXT,
    notes TEXT NOT NULL DEFAULT '',
    type TEXT NOT NULL DEFAULT 'project'
);

CREATE TABLE IF NOT EXISTS analytics (
    id TEXT PRIMARY KEY,
    total_tasks_completed NUMERIC NOT NULL DEFAULT 0,
    average_completion_time NUMERIC NOT NULL DEFAULT 0,
    on_time_completion_rate NUMERIC NOT NULL DEFAULT 0,
    productivity_by_hour JSONB NOT NULL DEFAULT '{}'::jsonb,
    priority_distribution JSONB NOT NULL DEFAULT '{}'::jsonb,
    last_updated TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS achievements (
    id TEXT PRIMARY KEY,
    total_points NUMERIC NOT NULL DEFAULT 0,
    level NUMERIC NOT NULL DEFAULT 1,
    unlocked JSONB NOT NULL DEFAULT '[]'::jsonb,
    last_updated TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

pub fn is_known_table(table: &str) -> bool {
    ALL_TABLES.contains(&table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_schema_covers_every_table_in_order() {
        let names: Vec<&str> = SQLITE_SCHEMA.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ALL_TABLES.to_vec());
        for (name, ddl) in SQLITE_SCHEMA {
            assert!(ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", name)));
        }
    }

    #[test]
    fn postgres_schema_mentions_every_table() {
        for table in ALL_TABLES {
            assert!(
                POSTGRES_SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)),
                "missing {table}"
            );
        }
    }

    #[test]
    fn known_tables() {
        assert!(is_known_table("activity_log"));
        assert!(!is_known_table("pg_tables"));
    }
}
