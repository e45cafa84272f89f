//! Snapshot file adapter error types.

use smarthome_domain::error::SmartHomeError;

/// Errors specific to reading a JSON snapshot file.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotJsonError {
    /// The file could not be read.
    #[error("failed to read snapshot file")]
    Io(#[source] std::io::Error),

    /// The file content is not a valid snapshot.
    #[error("failed to parse snapshot file")]
    Parse(#[source] serde_json::Error),
}

impl From<SnapshotJsonError> for SmartHomeError {
    fn from(err: SnapshotJsonError) -> Self {
        SmartHomeError::Load(Box::new(err))
    }
}
