use crate::core::schemas;

/// Legacy source files, in the order the pipeline processes them. Projects
/// have no file of their own; they come out of `clients.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Clients,
    Tasks,
    ActivityLog,
    ProgressLogs,
    Schedule,
    Revenue,
    Analytics,
    Achievements,
}

/// How a source file is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceShape {
    /// Top-level JSON array of records.
    Array,
    /// Object holding the records under a key (`{"entries": [...]}`).
    Envelope(&'static str),
    /// A single JSON object (singleton state).
    Object,
}

/// How records reach the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// One upsert for the whole collection.
    Whole,
    /// Sequential upserts of at most the configured chunk size.
    Chunked,
}

impl SourceKind {
    pub const ALL: [SourceKind; 8] = [
        SourceKind::Clients,
        SourceKind::Tasks,
        SourceKind::ActivityLog,
        SourceKind::ProgressLogs,
        SourceKind::Schedule,
        SourceKind::Revenue,
        SourceKind::Analytics,
        SourceKind::Achievements,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            SourceKind::Clients => "clients.json",
            SourceKind::Tasks => "tasks.json",
            SourceKind::ActivityLog => "activity.json",
            SourceKind::ProgressLogs => "progress-logs.json",
            SourceKind::Schedule => "schedule.json",
            SourceKind::Revenue => "revenue.json",
            SourceKind::Analytics => "analytics.json",
            SourceKind::Achievements => "achievements.json",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            SourceKind::Clients => schemas::CLIENTS,
            SourceKind::Tasks => schemas::TASKS,
            SourceKind::ActivityLog => schemas::ACTIVITY_LOG,
            SourceKind::ProgressLogs => schemas::PROGRESS_LOGS,
            SourceKind::Schedule => schemas::SCHEDULE,
            SourceKind::Revenue => schemas::REVENUE,
            SourceKind::Analytics => schemas::ANALYTICS,
            SourceKind::Achievements => schemas::ACHIEVEMENTS,
        }
    }

    pub fn shape(self) -> SourceShape {
        match self {
            SourceKind::Revenue => SourceShape::Envelope("entries"),
            SourceKind::Analytics | SourceKind::Achievements => SourceShape::Object,
            _ => SourceShape::Array,
        }
    }

    /// Activity logs grow without bound; everything else fits in one call.
    pub fn write_mode(self) -> WriteMode {
        match self {
            SourceKind::ActivityLog => WriteMode::Chunked,
            _ => WriteMode::Whole,
        }
    }
}

/// Human label for a destination table ("activity logs", "schedule entries").
pub fn table_label(table: &str) -> &str {
    match table {
        schemas::ACTIVITY_LOG => "activity logs",
        schemas::PROGRESS_LOGS => "progress logs",
        schemas::SCHEDULE => "schedule entries",
        schemas::REVENUE => "revenue entries",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_source_maps_to_a_known_table() {
        for kind in SourceKind::ALL {
            assert!(schemas::is_known_table(kind.table()));
            assert!(kind.file_name().ends_with(".json"));
        }
    }

    #[test]
    fn only_activity_log_is_chunked() {
        let chunked: Vec<SourceKind> = SourceKind::ALL
            .into_iter()
            .filter(|k| k.write_mode() == WriteMode::Chunked)
            .collect();
        assert_eq!(chunked, vec![SourceKind::ActivityLog]);
    }
}
