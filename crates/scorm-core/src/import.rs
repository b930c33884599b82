use chrono::Utc;

use crate::archive::ingest_archive;
use crate::error::IngestionError;
use crate::manifest::{parse_manifest, resolve_entry_point};
use crate::package::{CourseRecord, FileTable, ProgressState};

const UNTITLED: &str = "Untitled Course";

/// A freshly ingested course, ready to be handed to the store.
#[derive(Debug, Clone)]
pub struct ImportedPackage {
    pub record: CourseRecord,
    pub files: FileTable,
}

/// Ingest an uploaded archive and build its course record.
///
/// The title comes from the manifest, else the upload's file name without
/// its `.zip` suffix. A package without a resolvable entry point is still
/// imported; playback rejects it later.
pub fn import_package(bytes: &[u8], file_name: &str) -> Result<ImportedPackage, IngestionError> {
    let ingested = ingest_archive(bytes)?;
    let manifest = ingested
        .manifest_document
        .as_deref()
        .and_then(parse_manifest);
    let entry_path = resolve_entry_point(manifest.as_ref(), &ingested.files);

    let title = manifest
        .as_ref()
        .and_then(|m| m.title.clone())
        .unwrap_or_else(|| title_from_file_name(file_name));
    let description = manifest
        .as_ref()
        .map(|m| m.description.clone())
        .unwrap_or_default();

    let record = CourseRecord {
        id: CourseRecord::new_id(),
        title,
        description,
        manifest,
        entry_path,
        uploaded_at: Utc::now(),
        last_accessed: None,
        progress: ProgressState::default(),
        archive_sha256: ingested.sha256,
        file_count: ingested.files.len(),
    };

    if record.entry_path.is_none() {
        tracing::warn!(course_id = %record.id, "No entry point found; course will not be playable");
    }
    tracing::info!(
        course_id = %record.id,
        title = %record.title,
        entry = ?record.entry_path,
        files = record.file_count,
        "Course package imported"
    );

    Ok(ImportedPackage {
        record,
        files: ingested.files,
    })
}

fn title_from_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let stem = if base.to_ascii_lowercase().ends_with(".zip") {
        &base[..base.len() - 4]
    } else {
        base
    };
    if stem.trim().is_empty() {
        UNTITLED.into()
    } else {
        stem.to_string()
    }
}
