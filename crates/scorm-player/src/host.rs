use std::sync::{Arc, Mutex, PoisonError};

use crate::error::InjectionError;
use crate::shim::RuntimeShim;
use crate::virtualizer::PreparedDocument;

/// The runtime API instance handed to a host for one course.
pub type ApiHandle = Arc<RuntimeShim>;

/// Presents prepared documents and exposes the runtime API to them.
///
/// A host exposes the handle under both `API` and `API_1484_11` in the
/// context embedding the sandboxed document. Failing to reach that context
/// is reported as an [`InjectionError`]; the document stays mounted.
pub trait PlaybackHost: Send + Sync {
    fn mount(&self, document: &PreparedDocument, api: ApiHandle) -> Result<(), InjectionError>;

    fn unmount(&self);
}

#[derive(Default)]
struct Mounted {
    document: Option<PreparedDocument>,
    api: Option<ApiHandle>,
    mounts: usize,
}

/// A host with no presentation layer. It keeps whatever is mounted so
/// callers (the CLI, tests) can inspect it and drive the API directly.
#[derive(Default)]
pub struct HeadlessHost {
    mounted: Mutex<Mounted>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> Option<PreparedDocument> {
        self.lock().document.clone()
    }

    pub fn api(&self) -> Option<ApiHandle> {
        self.lock().api.clone()
    }

    /// Total number of successful mounts over the host's life.
    pub fn mount_count(&self) -> usize {
        self.lock().mounts
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Mounted> {
        self.mounted.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PlaybackHost for HeadlessHost {
    fn mount(&self, document: &PreparedDocument, api: ApiHandle) -> Result<(), InjectionError> {
        let mut mounted = self.lock();
        mounted.document = Some(document.clone());
        mounted.api = Some(api);
        mounted.mounts += 1;
        tracing::debug!(course_id = %document.course_id, url = %document.handle.url, "Document mounted");
        Ok(())
    }

    fn unmount(&self) {
        let mut mounted = self.lock();
        if let Some(document) = mounted.document.take() {
            tracing::debug!(course_id = %document.course_id, "Document unmounted");
        }
        mounted.api = None;
    }
}
