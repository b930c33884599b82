//! Persistence for the SCORM player.
//!
//! Storage is split into three keyspaces behind one [`StorageBackend`]
//! trait:
//!
//! - the **catalog**: every [`CourseRecord`](scorm_core::CourseRecord) in a
//!   single aggregate document, rewritten wholesale on each mutation;
//! - **blobs**: each course's [`FileTable`](scorm_core::FileTable), keyed by
//!   course id;
//! - **runtime data**: each course's flattened data-element mapping.
//!
//! [`CourseStore`] layers the ordering and merge rules on top of whichever
//! backend is selected.

pub mod backend;
pub mod disk;
pub mod error;
pub mod memory;
pub mod store;

pub use backend::{Catalog, StorageBackend, StoreFuture};
pub use disk::DiskBackend;
pub use error::StorageError;
pub use memory::MemoryBackend;
pub use store::CourseStore;
