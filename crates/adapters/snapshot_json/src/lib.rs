//! # smarthome-adapter-snapshot-json
//!
//! Reads the home snapshot (`data.json`) from disk.
//!
//! The file is read once per [`fetch`](SnapshotSource::fetch) with
//! `tokio::fs` and decoded with `serde_json`. Any IO or parse failure is
//! reported as [`SmartHomeError::Load`] so the registry can fall back to its
//! built-in snapshot.
//!
//! ## Dependency rule
//!
//! Depends on `smarthome-app` (port traits) and `smarthome-domain` only.

mod error;

pub use error::SnapshotJsonError;

use std::future::Future;
use std::path::{Path, PathBuf};

use smarthome_app::ports::SnapshotSource;
use smarthome_domain::error::SmartHomeError;
use smarthome_domain::snapshot::HomeSnapshot;

/// [`SnapshotSource`] backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<HomeSnapshot, SnapshotJsonError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(SnapshotJsonError::Io)?;
        let snapshot: HomeSnapshot =
            serde_json::from_slice(&bytes).map_err(SnapshotJsonError::Parse)?;
        tracing::debug!(
            path = %self.path.display(),
            devices = snapshot.devices.len(),
            "snapshot file decoded"
        );
        Ok(snapshot)
    }
}

impl SnapshotSource for JsonFileSource {
    fn fetch(&self) -> impl Future<Output = Result<HomeSnapshot, SmartHomeError>> + Send {
        async move { self.read().await.map_err(SmartHomeError::from) }
    }
}
