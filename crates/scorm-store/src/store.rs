use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use scorm_core::{CoursePackage, CourseRecord, DataElements, FileTable, ProgressState};

use crate::backend::StorageBackend;
use crate::disk::DiskBackend;
use crate::error::StorageError;
use crate::memory::MemoryBackend;

/// Course persistence over a selectable [`StorageBackend`].
///
/// Every catalog mutation is read-modify-write of the whole aggregate with
/// no version check, so concurrent writers are last-writer-wins. Callers are
/// expected to await one operation before issuing the next.
#[derive(Clone)]
pub struct CourseStore {
    backend: Arc<dyn StorageBackend>,
}

impl CourseStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Open (and create if needed) a disk-backed store.
    pub async fn on_disk(base_dir: PathBuf) -> Result<Self, StorageError> {
        let backend = DiskBackend::new(base_dir);
        backend.init().await?;
        Ok(Self::new(Arc::new(backend)))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    /// Persist a newly imported course.
    ///
    /// The blob is written before the catalog entry that points at it, so a
    /// failure can leave an orphaned blob but never a record without files.
    pub async fn save(&self, record: &CourseRecord, files: &FileTable) -> Result<(), StorageError> {
        self.backend.write_blob(&record.id, files).await?;

        let mut catalog = self.backend.read_catalog().await?;
        catalog.insert(record.id.clone(), record.clone());
        self.backend.write_catalog(&catalog).await?;

        tracing::info!(
            course_id = %record.id,
            backend = self.backend.backend_name(),
            "Course saved"
        );
        Ok(())
    }

    /// All course records, oldest upload first.
    pub async fn list(&self) -> Result<Vec<CourseRecord>, StorageError> {
        let catalog = self.backend.read_catalog().await?;
        let mut records: Vec<CourseRecord> = catalog.into_values().collect();
        records.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    /// Metadata only, without loading the file blob.
    pub async fn record(&self, course_id: &str) -> Result<Option<CourseRecord>, StorageError> {
        let catalog = self.backend.read_catalog().await?;
        Ok(catalog.get(course_id).cloned())
    }

    /// Metadata plus files. A record whose blob is missing comes back with an
    /// empty file table.
    pub async fn get(&self, course_id: &str) -> Result<Option<CoursePackage>, StorageError> {
        let Some(record) = self.record(course_id).await? else {
            return Ok(None);
        };
        let files = match self.backend.read_blob(course_id).await? {
            Some(files) => files,
            None => {
                tracing::warn!(course_id, "Course blob missing");
                FileTable::new()
            }
        };
        Ok(Some(CoursePackage { record, files }))
    }

    /// Remove a course's metadata, blob and runtime data.
    ///
    /// Best-effort: every step is attempted even if an earlier one fails, and
    /// nothing is rolled back. Blob and runtime-data failures are only
    /// logged; a catalog failure is returned. Returns whether the course was
    /// in the catalog.
    pub async fn delete(&self, course_id: &str) -> Result<bool, StorageError> {
        let catalog_result = self.remove_from_catalog(course_id).await;
        if let Err(e) = &catalog_result {
            tracing::error!(course_id, error = %e, "Failed to remove course metadata");
        }

        if let Err(e) = self.backend.delete_blob(course_id).await {
            tracing::error!(course_id, error = %e, "Failed to delete course blob");
        }

        if let Err(e) = self.backend.delete_runtime_data(course_id).await {
            tracing::error!(course_id, error = %e, "Failed to delete course runtime data");
        }

        let existed = catalog_result?;
        tracing::info!(course_id, existed, "Course deleted");
        Ok(existed)
    }

    async fn remove_from_catalog(&self, course_id: &str) -> Result<bool, StorageError> {
        let mut catalog = self.backend.read_catalog().await?;
        if catalog.remove(course_id).is_none() {
            return Ok(false);
        }
        self.backend.write_catalog(&catalog).await?;
        Ok(true)
    }

    /// Replace a course's progress and stamp its last-access time.
    ///
    /// An unknown course id is logged and ignored (`Ok(None)`): the course
    /// may have been deleted while it was playing.
    pub async fn update_progress(
        &self,
        course_id: &str,
        progress: ProgressState,
    ) -> Result<Option<CourseRecord>, StorageError> {
        let mut catalog = self.backend.read_catalog().await?;
        let Some(record) = catalog.get_mut(course_id) else {
            tracing::warn!(course_id, "Progress update for unknown course ignored");
            return Ok(None);
        };
        record.progress = progress;
        record.last_accessed = Some(Utc::now());
        let updated = record.clone();
        self.backend.write_catalog(&catalog).await?;

        tracing::debug!(
            course_id,
            status = %updated.progress.status,
            "Course progress updated"
        );
        Ok(Some(updated))
    }

    /// Stored runtime data for a course, empty if none.
    pub async fn runtime_data(&self, course_id: &str) -> Result<DataElements, StorageError> {
        Ok(self
            .backend
            .read_runtime_data(course_id)
            .await?
            .unwrap_or_default())
    }

    /// Merge `data` into the stored mapping and persist the result.
    ///
    /// Keys already stored but absent from `data` are kept; keys in `data`
    /// win. Returns the merged mapping.
    pub async fn merge_runtime_data(
        &self,
        course_id: &str,
        data: &DataElements,
    ) -> Result<DataElements, StorageError> {
        let mut merged = self.runtime_data(course_id).await?;
        merged.extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.backend.write_runtime_data(course_id, &merged).await?;
        Ok(merged)
    }
}
