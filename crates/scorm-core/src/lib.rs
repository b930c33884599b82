//! Course package model and ingestion for the SCORM player.
//!
//! This crate turns a raw ZIP upload into an in-memory [`FileTable`], parses
//! the optional `imsmanifest.xml`, and resolves the launch document. It does
//! no I/O beyond reading the bytes it is handed; persistence lives in
//! `scorm-store` and playback in `scorm-player`.
//!
//! ```rust,no_run
//! use scorm_core::import_package;
//!
//! # fn run(bytes: &[u8]) -> Result<(), scorm_core::IngestionError> {
//! let imported = import_package(bytes, "safety-training.zip")?;
//! println!("{} -> {:?}", imported.record.title, imported.record.entry_path);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod error;
pub mod import;
pub mod manifest;
pub mod media;
pub mod package;
pub mod timefmt;

pub use archive::{IngestedArchive, ingest_archive};
pub use error::IngestionError;
pub use import::{ImportedPackage, import_package};
pub use manifest::{parse_manifest, resolve_entry_point};
pub use package::{
    CoursePackage, CourseRecord, DataElements, Encoding, FileRecord, FileTable, Manifest, ProgressState,
    ProgressStatus, Score,
};
pub use timefmt::{format_time, parse_time};
