use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for IngestionError {
    fn from(err: zip::result::ZipError) -> Self {
        IngestionError::CorruptArchive(err.to_string())
    }
}
