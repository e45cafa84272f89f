//! Device — a controllable unit (light, fan, climate control, plain switch).
//!
//! A device carries one on/off [`PowerState`] and, depending on its
//! [`DeviceKind`], one integer control value (brightness, fan speed or target
//! temperature). All state transitions and the power-usage derivation live
//! here as pure functions; the registry in the `app` crate only routes
//! commands to them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{DeviceId, RoomId};
pub use crate::time::Timestamp;
use crate::time::now;

const LIGHT_MAX_WATTS: u32 = 60;
const FAN_WATTS_PER_LEVEL: u32 = 30;
const CLIMATE_BASE_WATTS: u32 = 500;
const CLIMATE_BOOST_WATTS: u32 = 200;
const CLIMATE_BOOST_BELOW: i32 = 22;

/// What a device is, which decides its control range and power formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Light,
    Fan,
    Climate,
    /// Pure on/off device without a continuous control.
    Switch,
}

impl DeviceKind {
    /// Valid range of the control value, or `None` for pure on/off kinds.
    #[must_use]
    pub fn control_range(self) -> Option<ControlRange> {
        match self {
            Self::Light => Some(ControlRange::BRIGHTNESS),
            Self::Fan => Some(ControlRange::FAN_SPEED),
            Self::Climate => Some(ControlRange::TEMPERATURE),
            Self::Switch => None,
        }
    }

    /// Control value used when a snapshot omits it.
    #[must_use]
    pub fn zero_value(self) -> i32 {
        self.control_range().map_or(0, |range| range.min)
    }

    /// Whether the on/off state follows the control value (and vice versa).
    #[must_use]
    pub fn is_coupled(self) -> bool {
        matches!(self, Self::Light | Self::Fan)
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Fan => f.write_str("fan"),
            Self::Climate => f.write_str("climate"),
            Self::Switch => f.write_str("switch"),
        }
    }
}

/// Inclusive bounds of a control value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRange {
    pub min: i32,
    pub max: i32,
}

impl ControlRange {
    /// Light brightness in percent.
    pub const BRIGHTNESS: Self = Self { min: 0, max: 100 };
    /// Discrete fan speed level.
    pub const FAN_SPEED: Self = Self { min: 0, max: 3 };
    /// Climate target temperature in °C.
    pub const TEMPERATURE: Self = Self { min: 16, max: 30 };

    /// Bring `value` inside the range.
    #[must_use]
    pub fn clamp(self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }
}

/// On/off state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    #[default]
    Off,
}

impl PowerState {
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    /// The opposite state.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// Named fan speed levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanSpeed {
    Off,
    Low,
    Medium,
    High,
}

impl FanSpeed {
    /// Map a stored fan control value to its level.
    #[must_use]
    pub fn from_level(level: i32) -> Option<Self> {
        match level {
            0 => Some(Self::Off),
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            _ => None,
        }
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("Off"),
            Self::Low => f.write_str("Low"),
            Self::Medium => f.write_str("Medium"),
            Self::High => f.write_str("High"),
        }
    }
}

/// Result of a control-value command: the stored (clamped) value and the
/// state the device ended up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlOutcome {
    pub value: i32,
    pub state: PowerState,
}

/// A controllable device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub kind: DeviceKind,
    pub state: PowerState,
    pub control_value: i32,
    /// Climate operating mode (e.g. `cool`), carried verbatim.
    pub mode: Option<String>,
    pub room: Option<RoomId>,
    pub last_changed: Timestamp,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Flip the on/off state and return the new state.
    ///
    /// Turning a light or fan off resets its control value to zero. Turning
    /// anything on leaves the value untouched, so a light can be on at 0%
    /// until its brightness is chosen.
    pub fn toggle(&mut self, at: Timestamp) -> PowerState {
        self.state = self.state.flipped();
        if self.kind.is_coupled() && !self.state.is_on() {
            self.control_value = 0;
        }
        self.last_changed = at;
        self.state
    }

    /// Clamp and store a new control value, then apply the on/off coupling.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoContinuousControl`] for pure on/off kinds.
    pub fn set_control_value(
        &mut self,
        value: i32,
        at: Timestamp,
    ) -> Result<ControlOutcome, ValidationError> {
        let range = self
            .kind
            .control_range()
            .ok_or_else(|| ValidationError::NoContinuousControl {
                id: self.id.to_string(),
                kind: self.kind,
            })?;

        let value = range.clamp(value);
        let before = (self.state, self.control_value);
        self.control_value = value;
        if self.kind.is_coupled() {
            if value > 0 && !self.state.is_on() {
                self.state = PowerState::On;
            } else if value == 0 && self.state.is_on() {
                self.state = PowerState::Off;
            }
        }
        if before != (self.state, self.control_value) {
            self.last_changed = at;
        }

        Ok(ControlOutcome {
            value,
            state: self.state,
        })
    }

    /// Turn the device off through [`toggle`](Self::toggle) if it is on.
    ///
    /// Returns whether anything changed.
    pub fn force_off(&mut self, at: Timestamp) -> bool {
        if self.state.is_on() {
            self.toggle(at);
            true
        } else {
            false
        }
    }

    /// Current power draw in watts, derived from kind, state and value.
    #[must_use]
    pub fn power_usage(&self) -> u32 {
        if !self.state.is_on() {
            return 0;
        }
        let level = u32::try_from(self.control_value).unwrap_or_default();
        match self.kind {
            // round(level / 100 * 60); level * 60 never ends in 50 so there are no ties
            DeviceKind::Light => (level * LIGHT_MAX_WATTS + 50) / 100,
            DeviceKind::Fan => level * FAN_WATTS_PER_LEVEL,
            DeviceKind::Climate => {
                if self.control_value < CLIMATE_BOOST_BELOW {
                    CLIMATE_BASE_WATTS + CLIMATE_BOOST_WATTS
                } else {
                    CLIMATE_BASE_WATTS
                }
            }
            DeviceKind::Switch => 0,
        }
    }

    /// Fan speed label, for fan devices only.
    #[must_use]
    pub fn fan_speed(&self) -> Option<FanSpeed> {
        match self.kind {
            DeviceKind::Fan => FanSpeed::from_level(self.control_value),
            _ => None,
        }
    }
}

/// Step-by-step builder for [`Device`].
///
/// `build` applies the ingestion rules: the value is clamped to the kind's
/// range, pure on/off kinds store zero, and a light or fan that is off stores
/// zero.
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    kind: Option<DeviceKind>,
    state: PowerState,
    control_value: Option<i32>,
    mode: Option<String>,
    room: Option<RoomId>,
    last_changed: Option<Timestamp>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: DeviceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn state(mut self, state: PowerState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn control_value(mut self, value: i32) -> Self {
        self.control_value = Some(value);
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    #[must_use]
    pub fn room(mut self, room: RoomId) -> Self {
        self.room = Some(room);
        self
    }

    #[must_use]
    pub fn last_changed(mut self, at: Timestamp) -> Self {
        self.last_changed = Some(at);
        self
    }

    /// Consume the builder and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyId`] if no id was given and
    /// [`ValidationError::MissingKind`] if no kind was given.
    pub fn build(self) -> Result<Device, ValidationError> {
        let id = self.id.ok_or(ValidationError::EmptyId)?;
        let kind = self
            .kind
            .ok_or_else(|| ValidationError::MissingKind(id.to_string()))?;

        let control_value = match kind.control_range() {
            None => 0,
            Some(_) if kind.is_coupled() && !self.state.is_on() => 0,
            Some(range) => range.clamp(self.control_value.unwrap_or_else(|| kind.zero_value())),
        };
        let mode = if kind == DeviceKind::Climate {
            self.mode
        } else {
            None
        };

        Ok(Device {
            name: self.name.unwrap_or_else(|| id.to_string()),
            id,
            kind,
            state: self.state,
            control_value,
            mode,
            room: self.room,
            last_changed: self.last_changed.unwrap_or_else(now),
        })
    }
}
