//! Snapshot source port — where the registry's initial state comes from.

use std::future::Future;

use smarthome_domain::error::SmartHomeError;
use smarthome_domain::snapshot::HomeSnapshot;

/// One-shot provider of a [`HomeSnapshot`].
///
/// Implementations should fail fast: the registry calls
/// [`fetch`](Self::fetch) once, without retry, and falls back to the built-in
/// snapshot on any error.
pub trait SnapshotSource {
    /// Fetch and decode the snapshot.
    ///
    /// Returns [`SmartHomeError::Load`] when the source is unreachable or
    /// malformed.
    fn fetch(&self) -> impl Future<Output = Result<HomeSnapshot, SmartHomeError>> + Send;
}

/// In-memory source returning a fixed snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    snapshot: HomeSnapshot,
}

impl StaticSource {
    #[must_use]
    pub fn new(snapshot: HomeSnapshot) -> Self {
        Self { snapshot }
    }
}

impl SnapshotSource for StaticSource {
    fn fetch(&self) -> impl Future<Output = Result<HomeSnapshot, SmartHomeError>> + Send {
        let snapshot = self.snapshot.clone();
        async { Ok(snapshot) }
    }
}
