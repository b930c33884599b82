use scorm_store::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("course not found: {0}")]
    CourseNotFound(String),

    #[error(transparent)]
    Virtualize(#[from] VirtualizeError),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum VirtualizeError {
    #[error("no entry point found for course {0}")]
    NoEntryPoint(String),

    #[error("entry document {path} missing from course {course_id}")]
    MissingEntryDocument { course_id: String, path: String },
}

/// The host could not expose the runtime API to the sandboxed document,
/// typically because the context is cross-origin. Downgraded to a warning by
/// [`Player`](crate::Player).
#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("sandboxed context unreachable: {0}")]
    Unreachable(String),
}
