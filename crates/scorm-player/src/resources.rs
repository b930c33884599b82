use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

const HANDLE_PREFIX: &str = "blob:scorm-player/";

/// Bytes behind a resource handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub media_type: String,
    pub bytes: Arc<Vec<u8>>,
}

/// A locally addressable stand-in for a packaged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    pub url: String,
    pub media_type: String,
    pub size: usize,
}

/// Process-wide table of resource handles served to sandboxed documents.
///
/// Handles are never released: each course load adds one handle per
/// rewritten reference plus one for the entry document, and they live until
/// the process exits.
// TODO: release a course's handles when its playback stops.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: Arc<RwLock<HashMap<String, Resource>>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, bytes: Vec<u8>, media_type: &str) -> ResourceHandle {
        let url = format!("{HANDLE_PREFIX}{}", uuid::Uuid::new_v4());
        let handle = ResourceHandle {
            url: url.clone(),
            media_type: media_type.to_string(),
            size: bytes.len(),
        };
        let resource = Resource {
            media_type: media_type.to_string(),
            bytes: Arc::new(bytes),
        };
        self.resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url, resource);
        handle
    }

    /// Resolve a handle URL to its bytes.
    pub fn fetch(&self, url: &str) -> Option<Resource> {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    pub fn is_handle(url: &str) -> bool {
        url.starts_with(HANDLE_PREFIX)
    }

    pub fn len(&self) -> usize {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
