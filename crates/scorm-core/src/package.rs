use std::collections::{BTreeMap, HashMap};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media;
use crate::timefmt::ZERO_TIME;

/// Runtime data elements of one course, keyed by dotted name
/// (`cmi.core.lesson_status`, `cmi.suspend_data`, ...).
pub type DataElements = BTreeMap<String, String>;

/// How a [`FileRecord`]'s `content` string is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    Text,
    Base64,
}

/// A single file extracted from a course archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Archive path with `/` separators and no leading `./` or `/`
    pub path: String,
    pub content: String,
    pub encoding: Encoding,
    pub media_type: String,
}

impl FileRecord {
    pub fn text(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            media_type: media::media_type(&path).into(),
            path,
            content: content.into(),
            encoding: Encoding::Text,
        }
    }

    pub fn binary(path: impl Into<String>, bytes: &[u8]) -> Self {
        let path = path.into();
        Self {
            media_type: media::media_type(&path).into(),
            path,
            content: BASE64.encode(bytes),
            encoding: Encoding::Base64,
        }
    }

    /// Raw bytes of the file, decoding base64 content when needed.
    pub fn bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        match self.encoding {
            Encoding::Text => Ok(self.content.as_bytes().to_vec()),
            Encoding::Base64 => BASE64.decode(self.content.as_bytes()),
        }
    }
}

/// Files of a course package in archive enumeration order.
///
/// Lookups are case-insensitive: `Images/Logo.PNG` and `images/logo.png`
/// name the same entry. Inserting a path that already exists (in any case)
/// replaces the earlier record in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FileRecord>", into = "Vec<FileRecord>")]
pub struct FileTable {
    records: Vec<FileRecord>,
    index: HashMap<String, usize>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: FileRecord) {
        let key = record.path.to_lowercase();
        match self.index.get(&key) {
            Some(&pos) => self.records[pos] = record,
            None => {
                self.index.insert(key, self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.index
            .get(&path.to_lowercase())
            .map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(&path.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<FileRecord>> for FileTable {
    fn from(records: Vec<FileRecord>) -> Self {
        let mut table = FileTable::new();
        for record in records {
            table.insert(record);
        }
        table
    }
}

impl From<FileTable> for Vec<FileRecord> {
    fn from(table: FileTable) -> Self {
        table.records
    }
}

/// The subset of `imsmanifest.xml` the player understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub title: Option<String>,
    /// `href` of the first `webcontent` resource
    pub launch_path: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
}

pub(crate) fn default_version() -> String {
    "1.2".into()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressStatus {
    #[default]
    #[serde(rename = "not attempted")]
    NotAttempted,
    #[serde(rename = "incomplete")]
    Incomplete,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "passed")]
    Passed,
    #[serde(rename = "failed")]
    Failed,
}

impl ProgressStatus {
    /// Map a lesson/completion status data element onto a progress status.
    ///
    /// Values from either runtime generation are accepted. Anything the
    /// course writes that is not recognised (`browsed`, vendor values) is
    /// treated as still in progress.
    pub fn from_cmi(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "not attempted" | "not-attempted" | "unknown" => ProgressStatus::NotAttempted,
            "completed" => ProgressStatus::Completed,
            "passed" => ProgressStatus::Passed,
            "failed" => ProgressStatus::Failed,
            _ => ProgressStatus::Incomplete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotAttempted => "not attempted",
            ProgressStatus::Incomplete => "incomplete",
            ProgressStatus::Completed => "completed",
            ProgressStatus::Passed => "passed",
            ProgressStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub raw: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Learner progress as shown in the course library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub status: ProgressStatus,
    #[serde(default)]
    pub score: Score,
    pub session_time: String,
    pub total_time: String,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            status: ProgressStatus::NotAttempted,
            score: Score::default(),
            session_time: ZERO_TIME.into(),
            total_time: ZERO_TIME.into(),
        }
    }
}

/// Course metadata, stored in the catalog separately from the file blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub manifest: Option<Manifest>,
    pub entry_path: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub last_accessed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub progress: ProgressState,
    /// SHA-256 hex of the uploaded archive bytes
    #[serde(default)]
    pub archive_sha256: String,
    #[serde(default)]
    pub file_count: usize,
}

impl CourseRecord {
    pub fn new_id() -> String {
        format!("course_{}", uuid::Uuid::new_v4().simple())
    }
}

/// A course record together with its extracted files.
#[derive(Debug, Clone, PartialEq)]
pub struct CoursePackage {
    pub record: CourseRecord,
    pub files: FileTable,
}

impl CoursePackage {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    /// The launch document, if the course has one and it is in the file table.
    pub fn entry_document(&self) -> Option<&FileRecord> {
        self.record
            .entry_path
            .as_deref()
            .and_then(|path| self.files.get(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_table_lookup_is_case_insensitive() {
        let mut table = FileTable::new();
        table.insert(FileRecord::text("Content/Index.HTML", "<html></html>"));

        assert!(table.contains("content/index.html"));
        assert_eq!(
            table.get("CONTENT/index.html").map(|r| r.path.as_str()),
            Some("Content/Index.HTML")
        );
    }

    #[test]
    fn file_table_keeps_enumeration_order_through_serde() {
        let mut table = FileTable::new();
        table.insert(FileRecord::text("b.html", "b"));
        table.insert(FileRecord::text("a.html", "a"));
        table.insert(FileRecord::binary("c.png", &[1, 2, 3]));

        let json = serde_json::to_string(&table).unwrap();
        let restored: FileTable = serde_json::from_str(&json).unwrap();

        let paths: Vec<_> = restored.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["b.html", "a.html", "c.png"]);
        assert!(restored.contains("C.PNG"));
    }

    #[test]
    fn binary_record_decodes_to_original_bytes() {
        let record = FileRecord::binary("logo.png", &[0x89, b'P', b'N', b'G']);
        assert_eq!(record.encoding, Encoding::Base64);
        assert_eq!(record.media_type, "image/png");
        assert_eq!(record.bytes().unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn status_serializes_with_display_names() {
        let json = serde_json::to_string(&ProgressStatus::NotAttempted).unwrap();
        assert_eq!(json, "\"not attempted\"");
        assert_eq!(ProgressStatus::from_cmi("Completed"), ProgressStatus::Completed);
        assert_eq!(ProgressStatus::from_cmi("browsed"), ProgressStatus::Incomplete);
        assert_eq!(ProgressStatus::from_cmi("unknown"), ProgressStatus::NotAttempted);
    }
}
