use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use scorm_core::{CourseRecord, DataElements, FileTable};

use crate::error::StorageError;

/// All course metadata, keyed by course id.
pub type Catalog = BTreeMap<String, CourseRecord>;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// A physical storage backend.
///
/// Backends only move documents in and out of the three keyspaces; ordering
/// and merge rules live in [`CourseStore`](crate::CourseStore). Deleting a
/// key that does not exist succeeds.
///
/// Uses Pin<Box<dyn Future>> for dyn-compatibility.
pub trait StorageBackend: Send + Sync {
    /// Backend name for logging and configuration.
    fn backend_name(&self) -> &str;

    fn read_catalog<'a>(&'a self) -> StoreFuture<'a, Catalog>;

    fn write_catalog<'a>(&'a self, catalog: &'a Catalog) -> StoreFuture<'a, ()>;

    fn read_blob<'a>(&'a self, course_id: &'a str) -> StoreFuture<'a, Option<FileTable>>;

    fn write_blob<'a>(&'a self, course_id: &'a str, files: &'a FileTable) -> StoreFuture<'a, ()>;

    fn delete_blob<'a>(&'a self, course_id: &'a str) -> StoreFuture<'a, ()>;

    fn read_runtime_data<'a>(&'a self, course_id: &'a str)
    -> StoreFuture<'a, Option<DataElements>>;

    fn write_runtime_data<'a>(
        &'a self,
        course_id: &'a str,
        data: &'a DataElements,
    ) -> StoreFuture<'a, ()>;

    fn delete_runtime_data<'a>(&'a self, course_id: &'a str) -> StoreFuture<'a, ()>;
}
