//! # smarthome-domain
//!
//! Pure domain model for the smarthome dashboard core.
//!
//! ## Responsibilities
//! - Typed identifiers for devices and rooms
//! - **Devices**: kind tag, on/off state, clamped control value, the
//!   on/off ⇔ value coupling and the power-usage formulas
//! - **Security mode** and its cascade rule on lights
//! - Chart **series** (environment, energy) and the weather reading
//! - The **snapshot** shape consumed at load time, and the built-in default
//! - Error conventions shared by every layer
//!
//! ## Dependency rule
//! This crate has **no internal dependencies** and performs no IO.
//! The load boundary is expressed as a trait in the `app` crate (port).

pub mod error;
pub mod id;

pub mod device;
pub mod security;
pub mod series;
pub mod snapshot;
pub mod time;
