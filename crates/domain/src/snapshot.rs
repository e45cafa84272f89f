//! Snapshot — the external configuration a registry is loaded from.
//!
//! The shape mirrors the dashboard's `data.json`:
//!
//! ```json
//! {
//!   "environment": { "timestamps": ["10:00"], "temperature": [21.5], "humidity": [40] },
//!   "energy": { "labels": ["Mon"], "usage": [12.4] },
//!   "devices": {
//!     "living-room-light": { "state": "on", "brightness": 80, "room": "living-room" },
//!     "thermostat": { "state": "on", "temperature": 22, "mode": "cool" }
//!   },
//!   "security": { "mode": "home" },
//!   "weather": { "condition": "sunny", "temperature": 24 }
//! }
//! ```
//!
//! Every key is optional. The `devices` object keeps its key order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::device::{Device, DeviceKind, PowerState};
use crate::error::ValidationError;
use crate::id::{DeviceId, RoomId};
use crate::security::{SecurityMode, SecuritySystem};
use crate::series::{EnergySeries, EnvironmentSeries, Weather};
use crate::time::Timestamp;

/// Full home snapshot as read from the external source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeSnapshot {
    pub environment: EnvironmentSeries,
    pub energy: EnergySeries,
    #[serde(with = "ordered_entries")]
    pub devices: Vec<(String, DeviceEntry)>,
    pub security: SecuritySystem,
    pub weather: Weather,
}

/// One device as described in a snapshot.
///
/// Only the control field matching the device kind is read. When `kind` is
/// absent it is inferred from whichever control field is present.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<DeviceKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub state: PowerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl DeviceEntry {
    /// The explicit kind, or the one implied by the control field present.
    #[must_use]
    pub fn resolved_kind(&self) -> Option<DeviceKind> {
        self.kind.or_else(|| {
            if self.brightness.is_some() {
                Some(DeviceKind::Light)
            } else if self.speed.is_some() {
                Some(DeviceKind::Fan)
            } else if self.temperature.is_some() {
                Some(DeviceKind::Climate)
            } else {
                None
            }
        })
    }

    fn control_field(&self, kind: DeviceKind) -> Option<f64> {
        match kind {
            DeviceKind::Light => self.brightness,
            DeviceKind::Fan => self.speed,
            DeviceKind::Climate => self.temperature,
            DeviceKind::Switch => None,
        }
    }

    /// Turn this entry into a [`Device`] with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyId`] for a blank id and
    /// [`ValidationError::MissingKind`] when no kind can be determined.
    pub fn to_device(&self, id: &str, at: Timestamp) -> Result<Device, ValidationError> {
        let id = DeviceId::new(id)?;
        let kind = self
            .resolved_kind()
            .ok_or_else(|| ValidationError::MissingKind(id.to_string()))?;

        let mut builder = Device::builder()
            .id(id)
            .kind(kind)
            .state(self.state)
            .last_changed(at);
        if let Some(value) = self.control_field(kind) {
            builder = builder.control_value(saturate(value));
        }
        if let Some(name) = &self.name {
            builder = builder.name(name.clone());
        }
        if let Some(mode) = &self.mode {
            builder = builder.mode(mode.clone());
        }
        if let Some(room) = self.room.as_deref().filter(|room| !room.trim().is_empty()) {
            builder = builder.room(RoomId::new(room)?);
        }
        builder.build()
    }
}

/// Round a JSON number to the nearest integer control value.
///
/// The float-to-int `as` cast saturates at the `i32` bounds and maps NaN to
/// zero, so the range clamp applied by the builder always sees a finite value.
#[allow(clippy::cast_possible_truncation)]
fn saturate(value: f64) -> i32 {
    value.round() as i32
}

impl HomeSnapshot {
    /// Build every device in snapshot order.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid entry or on a repeated id; no partial
    /// result is returned.
    pub fn build_devices(&self, at: Timestamp) -> Result<Vec<Device>, ValidationError> {
        let mut seen = HashSet::with_capacity(self.devices.len());
        let mut devices = Vec::with_capacity(self.devices.len());
        for (id, entry) in &self.devices {
            if !seen.insert(id.as_str()) {
                return Err(ValidationError::DuplicateId(id.clone()));
            }
            devices.push(entry.to_device(id, at)?);
        }
        Ok(devices)
    }

    /// Check the chart series.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SeriesLengthMismatch`] for misaligned series.
    pub fn validate_series(&self) -> Result<(), ValidationError> {
        self.environment.validate()?;
        self.energy.validate()
    }

    /// Ids listed in the snapshot, in order.
    pub fn device_ids(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(|(id, _)| id.as_str())
    }

    /// Built-in configuration used when the external source cannot be read.
    #[must_use]
    pub fn builtin() -> Self {
        let light = |name: &str, state: PowerState, brightness: f64, room: &str| DeviceEntry {
            kind: Some(DeviceKind::Light),
            name: Some(name.to_string()),
            state,
            brightness: Some(brightness),
            room: Some(room.to_string()),
            ..DeviceEntry::default()
        };
        let fan = |name: &str, state: PowerState, speed: f64, room: &str| DeviceEntry {
            kind: Some(DeviceKind::Fan),
            name: Some(name.to_string()),
            state,
            speed: Some(speed),
            room: Some(room.to_string()),
            ..DeviceEntry::default()
        };
        let thermostat = DeviceEntry {
            kind: Some(DeviceKind::Climate),
            name: Some("Thermostat".to_string()),
            state: PowerState::On,
            temperature: Some(22.0),
            mode: Some("cool".to_string()),
            room: Some("living-room".to_string()),
            ..DeviceEntry::default()
        };

        let devices = vec![
            (
                "living-room-light".to_string(),
                light("Living Room Light", PowerState::On, 80.0, "living-room"),
            ),
            (
                "living-room-fan".to_string(),
                fan("Living Room Fan", PowerState::On, 2.0, "living-room"),
            ),
            ("thermostat".to_string(), thermostat),
            (
                "bedroom-light".to_string(),
                light("Bedroom Light", PowerState::Off, 0.0, "bedroom"),
            ),
            (
                "bedroom-fan".to_string(),
                fan("Bedroom Fan", PowerState::Off, 0.0, "bedroom"),
            ),
            (
                "kitchen-light".to_string(),
                light("Kitchen Light", PowerState::On, 60.0, "kitchen"),
            ),
        ];

        let hours = ["00:00", "04:00", "08:00", "12:00", "16:00", "20:00"];
        let days = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

        Self {
            environment: EnvironmentSeries {
                timestamps: hours.iter().map(ToString::to_string).collect(),
                temperature: vec![20.5, 19.8, 21.2, 24.6, 25.1, 22.3],
                humidity: vec![45.0, 48.0, 44.0, 38.0, 36.0, 42.0],
            },
            energy: EnergySeries {
                labels: days.iter().map(ToString::to_string).collect(),
                usage: vec![12.4, 11.8, 13.1, 12.9, 14.2, 16.5, 15.3],
            },
            devices,
            security: SecuritySystem {
                mode: SecurityMode::Home,
            },
            weather: Weather {
                condition: "sunny".to_string(),
                temperature: 24.0,
                humidity: Some(40.0),
            },
        }
    }
}

mod ordered_entries {
    //! Device map (de)serialization that keeps the JSON object's key order.

    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::DeviceEntry;

    pub fn serialize<S: Serializer>(
        entries: &[(String, DeviceEntry)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (id, entry) in entries {
            map.serialize_entry(id, entry)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, DeviceEntry)>, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Vec<(String, DeviceEntry)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of device id to device entry")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, DeviceEntry>()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
