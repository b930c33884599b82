use std::path::{Path, PathBuf};

use scorm_core::{DataElements, FileTable};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::backend::{Catalog, StorageBackend, StoreFuture};
use crate::error::StorageError;

const CATALOG_FILE: &str = "courses.json";

/// File-system backend.
///
/// Directory layout:
/// ```text
/// base_dir/
///   courses.json        -- catalog of every course record
///   blobs/<id>.json     -- extracted file table
///   runtime/<id>.json   -- runtime data elements
/// ```
pub struct DiskBackend {
    base_dir: PathBuf,
}

impl DiskBackend {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Default storage location: ~/.scorm-player/
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".scorm-player")
    }

    /// Create the directory structure.
    pub async fn init(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(self.blobs_dir()).await?;
        tokio::fs::create_dir_all(self.runtime_dir()).await?;
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn catalog_path(&self) -> PathBuf {
        self.base_dir.join(CATALOG_FILE)
    }

    fn blobs_dir(&self) -> PathBuf {
        self.base_dir.join("blobs")
    }

    fn runtime_dir(&self) -> PathBuf {
        self.base_dir.join("runtime")
    }

    fn blob_path(&self, course_id: &str) -> Result<PathBuf, StorageError> {
        Ok(self.blobs_dir().join(file_name(course_id)?))
    }

    fn runtime_path(&self, course_id: &str) -> Result<PathBuf, StorageError> {
        Ok(self.runtime_dir().join(file_name(course_id)?))
    }
}

/// Course ids become file names, so anything that could escape the
/// directory is refused.
fn file_name(course_id: &str) -> Result<String, StorageError> {
    let valid = !course_id.is_empty()
        && course_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(StorageError::Backend(format!(
            "invalid course id for disk storage: {course_id:?}"
        )));
    }
    Ok(format!("{course_id}.json"))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

async fn remove_file(path: &Path) -> Result<(), StorageError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl StorageBackend for DiskBackend {
    fn backend_name(&self) -> &str {
        "disk"
    }

    fn read_catalog<'a>(&'a self) -> StoreFuture<'a, Catalog> {
        Box::pin(async move {
            Ok(read_json(&self.catalog_path()).await?.unwrap_or_default())
        })
    }

    fn write_catalog<'a>(&'a self, catalog: &'a Catalog) -> StoreFuture<'a, ()> {
        Box::pin(async move { write_json(&self.catalog_path(), catalog).await })
    }

    fn read_blob<'a>(&'a self, course_id: &'a str) -> StoreFuture<'a, Option<FileTable>> {
        Box::pin(async move { read_json(&self.blob_path(course_id)?).await })
    }

    fn write_blob<'a>(&'a self, course_id: &'a str, files: &'a FileTable) -> StoreFuture<'a, ()> {
        Box::pin(async move { write_json(&self.blob_path(course_id)?, files).await })
    }

    fn delete_blob<'a>(&'a self, course_id: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move { remove_file(&self.blob_path(course_id)?).await })
    }

    fn read_runtime_data<'a>(
        &'a self,
        course_id: &'a str,
    ) -> StoreFuture<'a, Option<DataElements>> {
        Box::pin(async move { read_json(&self.runtime_path(course_id)?).await })
    }

    fn write_runtime_data<'a>(
        &'a self,
        course_id: &'a str,
        data: &'a DataElements,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move { write_json(&self.runtime_path(course_id)?, data).await })
    }

    fn delete_runtime_data<'a>(&'a self, course_id: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move { remove_file(&self.runtime_path(course_id)?).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorm_core::FileRecord;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_documents_read_as_empty() {
        let tmp = TempDir::new().unwrap();
        let backend = DiskBackend::new(tmp.path().to_path_buf());
        backend.init().await.unwrap();

        assert!(backend.read_catalog().await.unwrap().is_empty());
        assert!(backend.read_blob("course_x").await.unwrap().is_none());
        assert!(backend.read_runtime_data("course_x").await.unwrap().is_none());
        backend.delete_blob("course_x").await.unwrap();
    }

    #[tokio::test]
    async fn blob_survives_a_new_backend_instance() {
        let tmp = TempDir::new().unwrap();
        let mut files = FileTable::new();
        files.insert(FileRecord::text("index.html", "<p>hi</p>"));
        files.insert(FileRecord::binary("logo.png", &[1, 2, 3]));

        let backend = DiskBackend::new(tmp.path().to_path_buf());
        backend.init().await.unwrap();
        backend.write_blob("course_a", &files).await.unwrap();

        let reopened = DiskBackend::new(tmp.path().to_path_buf());
        let restored = reopened.read_blob("course_a").await.unwrap().unwrap();
        assert_eq!(restored, files);
        assert!(tmp.path().join("blobs").join("course_a.json").exists());
    }

    #[tokio::test]
    async fn rejects_path_traversal_ids() {
        let tmp = TempDir::new().unwrap();
        let backend = DiskBackend::new(tmp.path().to_path_buf());

        let err = backend.read_blob("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
    }
}
