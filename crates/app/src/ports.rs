//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.

pub mod snapshot_source;

pub use snapshot_source::{SnapshotSource, StaticSource};
