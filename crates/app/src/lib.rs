//! # smarthome-app
//!
//! Application layer — the device registry and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define the driven port the registry is loaded through:
//!   - `SnapshotSource` — fetch a `HomeSnapshot` once at startup
//! - Provide the driving entry point used by the presentation layer:
//!   - `DeviceRegistry` — `toggle`, `set_control_value`, `set_security_mode`,
//!     `get`, `all_ids`, `power_usage`
//! - Recover from a failed load by falling back to the built-in snapshot
//!
//! ## Dependency rule
//! Depends on `smarthome-domain` only. Never imports adapter crates.
//! Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod registry;
