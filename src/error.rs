use std::io;

/// Failures along the payload pipeline. Integrity and validation failures
/// are kept apart so callers can tell a tampered download from an archive
/// that simply does not look like a workflow payload.
#[derive(thiserror::Error, Debug)]
pub enum PayloadError {
    #[error("payload is tampered or corrupt (authentication failed)")]
    Integrity,
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("no recognizable payload content: missing `workflows` or `workflow_mappings.json`")]
    MissingMarker,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, PayloadError>;
