//! # smarthome — headless dashboard core
//!
//! Composition root that wires the snapshot adapter into a device registry.
//!
//! ## Responsibilities
//! - Parse configuration (`smarthome.toml`, env vars)
//! - Install the tracing subscriber
//! - Load the home snapshot once, falling back to the built-in defaults
//! - Report every device, its power draw and the home totals
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use smarthome_adapter_snapshot_json::JsonFileSource;
use smarthome_app::registry::{DeviceRegistry, LoadOutcome};
use smarthome_domain::device::DeviceKind;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    let source = JsonFileSource::new(config.snapshot_path());
    let mut registry = DeviceRegistry::default();
    if let LoadOutcome::Fallback { reason } = registry.load_from(&source).await {
        tracing::info!(
            path = %source.path().display(),
            %reason,
            "could not load home data, showing built-in defaults"
        );
    }

    for room in registry.rooms() {
        let ids = registry.ids_in_room(room.as_str());
        tracing::info!(%room, devices = ids.len(), "room");
    }

    for device in registry.devices() {
        let setting = match device.kind {
            DeviceKind::Light => format!("{}%", device.control_value),
            DeviceKind::Fan => device
                .fan_speed()
                .map_or_else(|| device.control_value.to_string(), |speed| speed.to_string()),
            DeviceKind::Climate => format!("{}°C", device.control_value),
            DeviceKind::Switch => String::from("-"),
        };
        tracing::info!(
            id = %device.id,
            name = %device.name,
            kind = %device.kind,
            state = %device.state,
            %setting,
            watts = device.power_usage(),
            "device"
        );
    }

    let weather = registry.weather();
    tracing::info!(
        security = %registry.security_mode(),
        total_watts = registry.total_power_usage(),
        weekly_kwh = registry.energy().total(),
        weather = %weather.condition,
        outdoor_celsius = weather.temperature,
        "home summary"
    );

    Ok(())
}
