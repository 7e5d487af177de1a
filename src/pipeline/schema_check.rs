//! Companion check: do the destination tables exist?
//!
//! Read-only. Probes connectivity, then tries a one-row read per table.
//! Creating the hosted schema is a manual step; `manual_steps` spells it out.

use crate::core::output;
use crate::core::schemas::ALL_TABLES;
use crate::destination::Destination;
use crate::pipeline::report::{SchemaReport, TablePresence};

const DASHBOARD_URL: &str = "https://supabase.com/dashboard";
const HOSTED_SUFFIX: &str = ".supabase.co";

pub fn check_schema(dest: &mut dyn Destination) -> SchemaReport {
    let target = dest.label();
    if let Err(e) = dest.probe() {
        let msg = output::compact_error(&e.to_string());
        tracing::warn!(error = %msg, "connection probe failed");
        return SchemaReport {
            target,
            probe_error: Some(msg),
            tables: Vec::new(),
        };
    }

    let tables = ALL_TABLES
        .iter()
        .map(|table| match dest.read_one(table) {
            Ok(rows) => TablePresence {
                table: table.to_string(),
                exists: true,
                rows: rows.len(),
                error: None,
            },
            Err(e) => {
                tracing::debug!(table, error = %e, "table read failed");
                TablePresence {
                    table: table.to_string(),
                    exists: false,
                    rows: 0,
                    error: Some(output::compact_error(&e.to_string())),
                }
            }
        })
        .collect();

    SchemaReport {
        target,
        probe_error: None,
        tables,
    }
}

/// Project ref of a hosted URL: `https://<ref>.supabase.co` -> `<ref>`.
pub fn project_ref(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let project = host.strip_suffix(HOSTED_SUFFIX)?;
    if project.is_empty() || project.contains('.') {
        return None;
    }
    Some(project.to_string())
}

/// SQL editor of the project behind `url`, or the dashboard root when the
/// URL is not a hosted project URL.
pub fn sql_editor_url(url: Option<&str>) -> String {
    match url.and_then(project_ref) {
        Some(project) => format!("{}/project/{}/sql/new", DASHBOARD_URL, project),
        None => DASHBOARD_URL.to_string(),
    }
}

pub fn manual_steps(url: Option<&str>) -> Vec<String> {
    let editor = sql_editor_url(url);
    let first = if editor == DASHBOARD_URL {
        format!("Go to the Supabase dashboard: {} and open the SQL Editor", editor)
    } else {
        format!("Visit: {}", editor)
    };
    vec![
        first,
        "Copy contents of schema.sql (kanban-migrate schema sql > schema.sql)".to_string(),
        "Paste into SQL editor".to_string(),
        "Click \"Run\"".to_string(),
        "Run this check again to verify: kanban-migrate schema check".to_string(),
    ]
}
