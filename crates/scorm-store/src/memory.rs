use std::collections::HashMap;

use scorm_core::{DataElements, FileTable};
use tokio::sync::RwLock;

use crate::backend::{Catalog, StorageBackend, StoreFuture};

/// In-process backend. Contents are lost when the value is dropped.
#[derive(Default)]
pub struct MemoryBackend {
    catalog: RwLock<Catalog>,
    blobs: RwLock<HashMap<String, FileTable>>,
    runtime: RwLock<HashMap<String, DataElements>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn backend_name(&self) -> &str {
        "memory"
    }

    fn read_catalog<'a>(&'a self) -> StoreFuture<'a, Catalog> {
        Box::pin(async move { Ok(self.catalog.read().await.clone()) })
    }

    fn write_catalog<'a>(&'a self, catalog: &'a Catalog) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            *self.catalog.write().await = catalog.clone();
            Ok(())
        })
    }

    fn read_blob<'a>(&'a self, course_id: &'a str) -> StoreFuture<'a, Option<FileTable>> {
        Box::pin(async move { Ok(self.blobs.read().await.get(course_id).cloned()) })
    }

    fn write_blob<'a>(&'a self, course_id: &'a str, files: &'a FileTable) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.blobs
                .write()
                .await
                .insert(course_id.to_string(), files.clone());
            Ok(())
        })
    }

    fn delete_blob<'a>(&'a self, course_id: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.blobs.write().await.remove(course_id);
            Ok(())
        })
    }

    fn read_runtime_data<'a>(
        &'a self,
        course_id: &'a str,
    ) -> StoreFuture<'a, Option<DataElements>> {
        Box::pin(async move { Ok(self.runtime.read().await.get(course_id).cloned()) })
    }

    fn write_runtime_data<'a>(
        &'a self,
        course_id: &'a str,
        data: &'a DataElements,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.runtime
                .write()
                .await
                .insert(course_id.to_string(), data.clone());
            Ok(())
        })
    }

    fn delete_runtime_data<'a>(&'a self, course_id: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.runtime.write().await.remove(course_id);
            Ok(())
        })
    }
}
