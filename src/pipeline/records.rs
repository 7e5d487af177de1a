//! Legacy (V1 JSON) and canonical (V2 table) record shapes.
//!
//! Legacy structs mirror the camelCase files written by the V1 app. Apart
//! from `id`, every field is an untyped JSON value: the app wrote numbers as
//! form strings and timestamps as `Date.now()` often enough that a typed
//! field would drop whole records. Canonical structs are the exact
//! destination rows, one field per column, serialized in column order.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Ids in V1 files are usually strings, but some were written as
/// `Date.now()` numbers. Both become text ids.
fn loose_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match Option::<JsonValue>::deserialize(deserializer)? {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s)),
        Some(JsonValue::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string or number id, found {}",
            json_kind(&other)
        ))),
    }
}

/// Id of a raw element for rejection reports, whatever its type.
pub(crate) fn raw_id(item: &JsonValue) -> Option<String> {
    item.get("id").map(|v| match v {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    })
}

pub(crate) fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

// ===== Legacy (source) records =====

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyClient {
    #[serde(default, deserialize_with = "loose_id")]
    pub id: Option<String>,
    pub name: Option<JsonValue>,
    pub email: Option<JsonValue>,
    pub phone: Option<JsonValue>,
    pub company: Option<JsonValue>,
    pub rate: Option<JsonValue>,
    pub rate_type: Option<JsonValue>,
    pub status: Option<JsonValue>,
    pub notes: Option<JsonValue>,
    pub tags: Option<JsonValue>,
    pub contacts: Option<JsonValue>,
    pub locations: Option<JsonValue>,
    pub total_revenue: Option<JsonValue>,
    pub created_at: Option<JsonValue>,
    pub updated_at: Option<JsonValue>,
    /// Raw project elements; each is decoded on its own so one bad project
    /// does not take the client or its siblings with it.
    pub projects: Option<JsonValue>,
}

impl LegacyClient {
    /// Embedded project elements. Anything but an array holds none.
    pub fn embedded_projects(&self) -> &[JsonValue] {
        embedded_projects(self.projects.as_ref())
    }
}

/// Project elements under a raw `projects` value.
pub fn embedded_projects(projects: Option<&JsonValue>) -> &[JsonValue] {
    match projects {
        Some(JsonValue::Array(items)) => items,
        _ => &[],
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProject {
    #[serde(default, deserialize_with = "loose_id")]
    pub id: Option<String>,
    pub name: Option<JsonValue>,
    pub description: Option<JsonValue>,
    pub status: Option<JsonValue>,
    pub value: Option<JsonValue>,
    pub currency: Option<JsonValue>,
    pub deadline: Option<JsonValue>,
    pub location_id: Option<JsonValue>,
    pub created_at: Option<JsonValue>,
    pub updated_at: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTask {
    #[serde(default, deserialize_with = "loose_id")]
    pub id: Option<String>,
    pub title: Option<JsonValue>,
    pub description: Option<JsonValue>,
    pub priority: Option<JsonValue>,
    pub status: Option<JsonValue>,
    pub assignee: Option<JsonValue>,
    pub estimated_minutes: Option<JsonValue>,
    pub deadline: Option<JsonValue>,
    pub subtasks: Option<JsonValue>,
    pub tags: Option<JsonValue>,
    pub client_id: Option<JsonValue>,
    pub project_id: Option<JsonValue>,
    pub calendar_event_id: Option<JsonValue>,
    pub scheduled_start: Option<JsonValue>,
    pub scheduled_end: Option<JsonValue>,
    /// Written snake_case by the V1 time tracker.
    #[serde(rename = "time_tracked")]
    pub time_tracked: Option<JsonValue>,
    #[serde(rename = "time_sessions")]
    pub time_sessions: Option<JsonValue>,
    pub created_at: Option<JsonValue>,
    pub updated_at: Option<JsonValue>,
    pub completed_at: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyActivity {
    #[serde(default, deserialize_with = "loose_id")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<JsonValue>,
    pub description: Option<JsonValue>,
    pub metadata: Option<JsonValue>,
    pub timestamp: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProgressLog {
    #[serde(default, deserialize_with = "loose_id")]
    pub id: Option<String>,
    pub task_id: Option<JsonValue>,
    pub task_title: Option<JsonValue>,
    pub status: Option<JsonValue>,
    pub comment: Option<JsonValue>,
    pub actual_minutes: Option<JsonValue>,
    pub timestamp: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyScheduleEntry {
    #[serde(default, deserialize_with = "loose_id")]
    pub id: Option<String>,
    pub task_id: Option<JsonValue>,
    pub task_title: Option<JsonValue>,
    pub start: Option<JsonValue>,
    pub end: Option<JsonValue>,
    pub created_at: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRevenueEntry {
    #[serde(default, deserialize_with = "loose_id")]
    pub id: Option<String>,
    pub client_id: Option<JsonValue>,
    pub client_name: Option<JsonValue>,
    pub project_id: Option<JsonValue>,
    pub project_name: Option<JsonValue>,
    pub amount: Option<JsonValue>,
    pub month: Option<JsonValue>,
    pub year: Option<JsonValue>,
    pub date: Option<JsonValue>,
    pub notes: Option<JsonValue>,
    #[serde(rename = "type")]
    pub kind: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAnalytics {
    pub total_tasks_completed: Option<JsonValue>,
    pub average_completion_time: Option<JsonValue>,
    pub on_time_completion_rate: Option<JsonValue>,
    pub productivity_by_hour: Option<JsonValue>,
    pub priority_distribution: Option<JsonValue>,
    pub last_updated: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAchievements {
    pub total_points: Option<JsonValue>,
    pub level: Option<JsonValue>,
    pub unlocked: Option<JsonValue>,
}

// ===== Canonical (destination) rows =====
//
// Defaulted columns hold whatever truthy value the source had, of any JSON
// type; absent pass-through columns are explicit nulls.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRow {
    pub id: String,
    pub name: JsonValue,
    pub email: JsonValue,
    pub phone: JsonValue,
    pub company: JsonValue,
    pub rate: JsonValue,
    pub rate_type: JsonValue,
    pub status: JsonValue,
    pub notes: JsonValue,
    pub tags: JsonValue,
    pub contacts: JsonValue,
    pub locations: JsonValue,
    pub total_revenue: JsonValue,
    pub created_at: JsonValue,
    pub updated_at: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRow {
    pub id: String,
    pub client_id: String,
    pub name: JsonValue,
    pub description: JsonValue,
    pub status: JsonValue,
    pub value: JsonValue,
    pub currency: JsonValue,
    pub deadline: JsonValue,
    pub location_id: JsonValue,
    pub created_at: JsonValue,
    pub updated_at: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRow {
    pub id: String,
    pub title: JsonValue,
    pub description: JsonValue,
    pub priority: JsonValue,
    pub status: JsonValue,
    pub assignee: JsonValue,
    pub estimated_minutes: JsonValue,
    pub deadline: JsonValue,
    pub subtasks: JsonValue,
    pub tags: JsonValue,
    pub client_id: JsonValue,
    pub project_id: JsonValue,
    pub calendar_event_id: JsonValue,
    pub scheduled_start: JsonValue,
    pub scheduled_end: JsonValue,
    pub time_tracked: JsonValue,
    pub time_sessions: JsonValue,
    pub created_at: JsonValue,
    pub updated_at: JsonValue,
    pub completed_at: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRow {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: JsonValue,
    pub description: JsonValue,
    pub metadata: JsonValue,
    pub timestamp: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressLogRow {
    pub id: String,
    pub task_id: JsonValue,
    pub task_title: JsonValue,
    pub status: JsonValue,
    pub comment: JsonValue,
    pub actual_minutes: JsonValue,
    pub timestamp: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRow {
    pub id: String,
    pub task_id: JsonValue,
    pub task_title: JsonValue,
    pub start_time: JsonValue,
    pub end_time: JsonValue,
    pub created_at: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueRow {
    pub id: String,
    pub client_id: JsonValue,
    pub client_name: JsonValue,
    pub project_id: JsonValue,
    pub project_name: JsonValue,
    pub amount: JsonValue,
    pub month: JsonValue,
    pub year: JsonValue,
    pub date: JsonValue,
    pub notes: JsonValue,
    #[serde(rename = "type")]
    pub kind: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsRow {
    pub id: String,
    pub total_tasks_completed: JsonValue,
    pub average_completion_time: JsonValue,
    pub on_time_completion_rate: JsonValue,
    pub productivity_by_hour: JsonValue,
    pub priority_distribution: JsonValue,
    pub last_updated: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementsRow {
    pub id: String,
    pub total_points: JsonValue,
    pub level: JsonValue,
    pub unlocked: JsonValue,
    pub last_updated: String,
}
