//! Source loader for the V1 JSON data directory.
//!
//! A missing or unreadable file never aborts the run; it comes back as
//! `SourceLoad::Missing` / `SourceLoad::Unreadable` and the stage skips.

use crate::pipeline::entity::{SourceKind, SourceShape};
use crate::pipeline::records::{json_kind, raw_id};
use crate::pipeline::report::Rejection;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum SourceLoad<T> {
    Loaded(T),
    Missing,
    Unreadable(String),
}

/// Raw file contents plus the fingerprint recorded in the run journal.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub value: JsonValue,
    pub bytes: usize,
    pub sha256: String,
}

/// Records decoded from a collection file. Elements that do not fit the
/// legacy shape are listed in `rejected` instead of failing the file.
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub records: Vec<T>,
    pub rejected: Vec<Rejection>,
    /// The raw elements behind `rejected`, in the same order.
    pub rejected_items: Vec<JsonValue>,
    pub file: Option<FileFingerprint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFingerprint {
    pub bytes: usize,
    pub sha256: String,
}

impl<T> Decoded<T> {
    /// Elements found in the file, decodable or not.
    pub fn found(&self) -> usize {
        self.records.len() + self.rejected.len()
    }
}

pub struct SourceDir {
    root: PathBuf,
}

impl SourceDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, kind: SourceKind) -> PathBuf {
        self.root.join(kind.file_name())
    }

    /// Read and parse one file without interpreting its shape.
    pub fn load_raw(&self, kind: SourceKind) -> SourceLoad<SourceFile> {
        let path = self.path_of(kind);
        let content = match fs::read(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return SourceLoad::Missing,
            Err(e) => return SourceLoad::Unreadable(format!("{}: {}", path.display(), e)),
        };
        let value: JsonValue = match serde_json::from_slice(&content) {
            Ok(v) => v,
            Err(e) => return SourceLoad::Unreadable(format!("{}: {}", path.display(), e)),
        };
        SourceLoad::Loaded(SourceFile {
            value,
            bytes: content.len(),
            sha256: format!("{:x}", Sha256::digest(&content)),
        })
    }

    /// Load a collection file (plain array or envelope) and decode each
    /// element. `null` and an envelope without its key read as empty.
    pub fn load_collection<T: DeserializeOwned>(&self, kind: SourceKind) -> SourceLoad<Decoded<T>> {
        let file = match self.load_raw(kind) {
            SourceLoad::Loaded(f) => f,
            SourceLoad::Missing => return SourceLoad::Missing,
            SourceLoad::Unreadable(e) => return SourceLoad::Unreadable(e),
        };
        let fingerprint = FileFingerprint {
            bytes: file.bytes,
            sha256: file.sha256,
        };

        let items = match (kind.shape(), file.value) {
            (_, JsonValue::Null) => Vec::new(),
            (SourceShape::Array, JsonValue::Array(items)) => items,
            // Older exports saved the revenue list bare.
            (SourceShape::Envelope(_), JsonValue::Array(items)) => items,
            (SourceShape::Envelope(key), JsonValue::Object(mut obj)) => match obj.remove(key) {
                None | Some(JsonValue::Null) => Vec::new(),
                Some(JsonValue::Array(items)) => items,
                Some(other) => {
                    return SourceLoad::Unreadable(format!(
                        "{}: '{}' must be an array, found {}",
                        kind.file_name(),
                        key,
                        json_kind(&other)
                    ));
                }
            },
            (shape, other) => {
                return SourceLoad::Unreadable(format!(
                    "{}: expected {}, found {}",
                    kind.file_name(),
                    match shape {
                        SourceShape::Array => "a JSON array".to_string(),
                        SourceShape::Envelope(key) => format!("an object with '{}'", key),
                        SourceShape::Object => "a JSON object".to_string(),
                    },
                    json_kind(&other)
                ));
            }
        };

        let (records, rejected, rejected_items) = decode_each(items);
        SourceLoad::Loaded(Decoded {
            records,
            rejected,
            rejected_items,
            file: Some(fingerprint),
        })
    }

    /// Load a singleton object. `null` reads as missing.
    pub fn load_object<T: DeserializeOwned>(
        &self,
        kind: SourceKind,
    ) -> SourceLoad<(T, FileFingerprint)> {
        let file = match self.load_raw(kind) {
            SourceLoad::Loaded(f) => f,
            SourceLoad::Missing => return SourceLoad::Missing,
            SourceLoad::Unreadable(e) => return SourceLoad::Unreadable(e),
        };
        let fingerprint = FileFingerprint {
            bytes: file.bytes,
            sha256: file.sha256,
        };
        match file.value {
            JsonValue::Null => SourceLoad::Missing,
            value @ JsonValue::Object(_) => match serde_json::from_value(value) {
                Ok(v) => SourceLoad::Loaded((v, fingerprint)),
                Err(e) => SourceLoad::Unreadable(format!("{}: {}", kind.file_name(), e)),
            },
            other => SourceLoad::Unreadable(format!(
                "{}: expected a JSON object, found {}",
                kind.file_name(),
                json_kind(&other)
            )),
        }
    }
}

fn decode_each<T: DeserializeOwned>(
    items: Vec<JsonValue>,
) -> (Vec<T>, Vec<Rejection>, Vec<JsonValue>) {
    let mut records = Vec::with_capacity(items.len());
    let mut rejected = Vec::new();
    let mut rejected_items = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let id = raw_id(&item);
        match T::deserialize(&item) {
            Ok(r) => records.push(r),
            Err(e) => {
                rejected.push(Rejection {
                    index,
                    id,
                    reason: e.to_string(),
                });
                rejected_items.push(item);
            }
        }
    }
    (records, rejected, rejected_items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::records::{LegacyAnalytics, LegacyRevenueEntry, LegacyTask};

    fn dir_with(files: &[(&str, &str)]) -> (tempfile::TempDir, SourceDir) {
        let tmp = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(tmp.path().join(name), content).unwrap();
        }
        let dir = SourceDir::new(tmp.path());
        (tmp, dir)
    }

    #[test]
    fn missing_file_is_missing() {
        let (_tmp, dir) = dir_with(&[]);
        assert!(matches!(
            dir.load_collection::<LegacyTask>(SourceKind::Tasks),
            SourceLoad::Missing
        ));
    }

    #[test]
    fn broken_json_is_unreadable() {
        let (_tmp, dir) = dir_with(&[("tasks.json", "[{\"id\": ")]);
        match dir.load_collection::<LegacyTask>(SourceKind::Tasks) {
            SourceLoad::Unreadable(msg) => assert!(msg.contains("tasks.json")),
            other => panic!("expected unreadable, got {:?}", other),
        }
    }

    #[test]
    fn bad_elements_are_rejected_individually() {
        let (_tmp, dir) = dir_with(&[(
            "tasks.json",
            r#"[{"id": "t1"}, 42, {"id": {"n": 3}}, {"id": "t4", "estimatedMinutes": "soon"}]"#,
        )]);
        let SourceLoad::Loaded(decoded) = dir.load_collection::<LegacyTask>(SourceKind::Tasks)
        else {
            panic!("expected loaded");
        };
        assert_eq!(decoded.records.len(), 2);
        assert_eq!(decoded.found(), 4);
        let idx: Vec<usize> = decoded.rejected.iter().map(|r| r.index).collect();
        assert_eq!(idx, vec![1, 2]);
        assert_eq!(decoded.rejected[1].id.as_deref(), Some(r#"{"n":3}"#));
        assert_eq!(decoded.rejected_items[0], serde_json::json!(42));
        assert_eq!(decoded.records[1].estimated_minutes, Some(serde_json::json!("soon")));
        let fp = decoded.file.unwrap();
        assert_eq!(fp.sha256.len(), 64);
        assert!(fp.bytes > 0);
    }

    #[test]
    fn revenue_envelope_and_bare_list() {
        let (_tmp, dir) = dir_with(&[("revenue.json", r#"{"entries": [{"id": "r1"}], "total": 5}"#)]);
        let SourceLoad::Loaded(d) = dir.load_collection::<LegacyRevenueEntry>(SourceKind::Revenue)
        else {
            panic!("expected loaded");
        };
        assert_eq!(d.records.len(), 1);

        let (_tmp2, dir2) = dir_with(&[("revenue.json", r#"[{"id": "r1"}, {"id": "r2"}]"#)]);
        let SourceLoad::Loaded(d2) =
            dir2.load_collection::<LegacyRevenueEntry>(SourceKind::Revenue)
        else {
            panic!("expected loaded");
        };
        assert_eq!(d2.records.len(), 2);

        let (_tmp3, dir3) = dir_with(&[("revenue.json", r#"{"total": 0}"#)]);
        let SourceLoad::Loaded(d3) =
            dir3.load_collection::<LegacyRevenueEntry>(SourceKind::Revenue)
        else {
            panic!("expected loaded");
        };
        assert_eq!(d3.found(), 0);
    }

    #[test]
    fn object_where_array_expected_is_unreadable() {
        let (_tmp, dir) = dir_with(&[("tasks.json", r#"{"id": "t1"}"#)]);
        match dir.load_collection::<LegacyTask>(SourceKind::Tasks) {
            SourceLoad::Unreadable(msg) => assert!(msg.contains("expected a JSON array")),
            other => panic!("expected unreadable, got {:?}", other),
        }
    }

    #[test]
    fn singleton_null_reads_as_missing() {
        let (_tmp, dir) = dir_with(&[("analytics.json", "null")]);
        assert!(matches!(
            dir.load_object::<LegacyAnalytics>(SourceKind::Analytics),
            SourceLoad::Missing
        ));
    }

    #[test]
    fn singleton_object_loads() {
        let (_tmp, dir) = dir_with(&[("analytics.json", r#"{"totalTasksCompleted": 12}"#)]);
        let SourceLoad::Loaded((a, _)) = dir.load_object::<LegacyAnalytics>(SourceKind::Analytics)
        else {
            panic!("expected loaded");
        };
        assert_eq!(a.total_tasks_completed.unwrap().as_u64(), Some(12));
    }
}
