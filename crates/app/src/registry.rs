//! Device registry — the single source of truth for device state.
//!
//! The registry owns every [`Device`] and is the only code path allowed to
//! mutate one. Callers get copies back, never references into the registry.
//! Every command is synchronous and takes `&mut self`; the registry assumes a
//! single event-driven caller and does no locking of its own.

use std::collections::HashMap;

use smarthome_domain::device::{ControlOutcome, Device, DeviceKind, PowerState};
use smarthome_domain::error::{NotFoundError, SmartHomeError};
use smarthome_domain::id::{DeviceId, RoomId};
use smarthome_domain::security::SecurityMode;
use smarthome_domain::series::{EnergySeries, EnvironmentSeries, Weather};
use smarthome_domain::snapshot::HomeSnapshot;
use smarthome_domain::time::now;

use crate::ports::SnapshotSource;

/// How [`DeviceRegistry::load_from`] ended.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The source snapshot was applied.
    Loaded { devices: usize },
    /// The source failed; the built-in snapshot was applied instead.
    Fallback { reason: SmartHomeError },
}

impl LoadOutcome {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Owner of every device, the security mode and the chart data.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
    index: HashMap<DeviceId, usize>,
    security: SecurityMode,
    environment: EnvironmentSeries,
    energy: EnergySeries,
    weather: Weather,
}

impl DeviceRegistry {
    /// Build a registry from a snapshot, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] if any device entry or series
    /// is invalid.
    pub fn from_snapshot(snapshot: &HomeSnapshot) -> Result<Self, SmartHomeError> {
        snapshot.validate_series()?;
        let devices = snapshot.build_devices(now())?;
        let index = devices
            .iter()
            .enumerate()
            .map(|(position, device)| (device.id.clone(), position))
            .collect();

        Ok(Self {
            devices,
            index,
            security: snapshot.security.mode,
            environment: snapshot.environment.clone(),
            energy: snapshot.energy.clone(),
            weather: snapshot.weather.clone(),
        })
    }

    /// Registry populated from [`HomeSnapshot::builtin`].
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        registry.apply_builtin();
        registry
    }

    /// Replace all state with the content of `snapshot`.
    ///
    /// On error the current state is left untouched.
    ///
    /// # Errors
    ///
    /// See [`DeviceRegistry::from_snapshot`].
    #[tracing::instrument(skip_all, fields(devices = snapshot.devices.len()))]
    pub fn replace(&mut self, snapshot: &HomeSnapshot) -> Result<(), SmartHomeError> {
        *self = Self::from_snapshot(snapshot)?;
        Ok(())
    }

    /// Fetch a snapshot once from `source` and apply it.
    ///
    /// Any fetch or validation failure is recovered by applying the built-in
    /// snapshot; the failure is returned in [`LoadOutcome::Fallback`] for the
    /// caller to surface as a notice.
    pub async fn load_from<S: SnapshotSource>(&mut self, source: &S) -> LoadOutcome {
        let result = source
            .fetch()
            .await
            .and_then(|snapshot| self.replace(&snapshot));

        match result {
            Ok(()) => {
                tracing::info!(devices = self.devices.len(), "home snapshot loaded");
                LoadOutcome::Loaded {
                    devices: self.devices.len(),
                }
            }
            Err(reason) => {
                tracing::warn!(error = ?reason, "home snapshot unavailable, using built-in defaults");
                self.apply_builtin();
                LoadOutcome::Fallback { reason }
            }
        }
    }

    fn apply_builtin(&mut self) {
        if let Err(err) = self.replace(&HomeSnapshot::builtin()) {
            tracing::error!(error = ?err, "built-in snapshot rejected");
        }
    }

    /// Flip a device on or off and return its new state.
    ///
    /// Lights and fans turned off have their control value reset to zero.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] for an unknown id.
    #[tracing::instrument(skip(self))]
    pub fn toggle(&mut self, id: &str) -> Result<PowerState, SmartHomeError> {
        let device = self.device_mut(id)?;
        let state = device.toggle(now());
        tracing::debug!(%state, value = device.control_value, "device toggled");
        Ok(state)
    }

    /// Clamp and store a control value, switching lights and fans on or off
    /// to match.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] for an unknown id and
    /// [`SmartHomeError::Validation`] for a device without continuous control.
    #[tracing::instrument(skip(self))]
    pub fn set_control_value(
        &mut self,
        id: &str,
        value: i32,
    ) -> Result<ControlOutcome, SmartHomeError> {
        let device = self.device_mut(id)?;
        let outcome = device.set_control_value(value, now())?;
        tracing::debug!(value = outcome.value, state = %outcome.state, "control value applied");
        Ok(outcome)
    }

    /// Set the security mode and return the ids of devices it changed.
    ///
    /// Entering [`SecurityMode::Away`] turns every light off the same way
    /// [`toggle`](Self::toggle) does.
    #[tracing::instrument(skip(self))]
    pub fn set_security_mode(&mut self, mode: SecurityMode) -> Vec<DeviceId> {
        self.security = mode;
        if !mode.forces_lights_off() {
            return Vec::new();
        }

        let at = now();
        let mut changed = Vec::new();
        for device in &mut self.devices {
            if device.kind == DeviceKind::Light && device.force_off(at) {
                changed.push(device.id.clone());
            }
        }
        tracing::debug!(changed = changed.len(), "lights switched off by security mode");
        changed
    }

    /// Current security mode.
    #[must_use]
    pub fn security_mode(&self) -> SecurityMode {
        self.security
    }

    /// Current power draw of one device, in watts.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] for an unknown id.
    pub fn power_usage(&self, id: &str) -> Result<u32, SmartHomeError> {
        self.device(id).map(Device::power_usage)
    }

    /// Sum of every device's power draw, in watts.
    #[must_use]
    pub fn total_power_usage(&self) -> u32 {
        self.devices.iter().map(Device::power_usage).sum()
    }

    /// Copy of one device.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] for an unknown id.
    pub fn get(&self, id: &str) -> Result<Device, SmartHomeError> {
        self.device(id).cloned()
    }

    /// Every device id, in load order.
    #[must_use]
    pub fn all_ids(&self) -> Vec<DeviceId> {
        self.devices.iter().map(|device| device.id.clone()).collect()
    }

    /// Copies of every device, in load order.
    #[must_use]
    pub fn devices(&self) -> Vec<Device> {
        self.devices.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Rooms in order of first appearance.
    #[must_use]
    pub fn rooms(&self) -> Vec<RoomId> {
        let mut rooms: Vec<RoomId> = Vec::new();
        for room in self.devices.iter().filter_map(|device| device.room.as_ref()) {
            if !rooms.contains(room) {
                rooms.push(room.clone());
            }
        }
        rooms
    }

    /// Ids of the devices in `room`, in load order.
    #[must_use]
    pub fn ids_in_room(&self, room: &str) -> Vec<DeviceId> {
        self.devices
            .iter()
            .filter(|device| device.room.as_ref().is_some_and(|r| r.as_str() == room))
            .map(|device| device.id.clone())
            .collect()
    }

    #[must_use]
    pub fn environment(&self) -> EnvironmentSeries {
        self.environment.clone()
    }

    /// Replace the environment series.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] for misaligned sequences.
    pub fn set_environment(&mut self, series: EnvironmentSeries) -> Result<(), SmartHomeError> {
        series.validate()?;
        self.environment = series;
        Ok(())
    }

    #[must_use]
    pub fn energy(&self) -> EnergySeries {
        self.energy.clone()
    }

    /// Replace the energy series.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] for misaligned sequences.
    pub fn set_energy(&mut self, series: EnergySeries) -> Result<(), SmartHomeError> {
        series.validate()?;
        self.energy = series;
        Ok(())
    }

    #[must_use]
    pub fn weather(&self) -> Weather {
        self.weather.clone()
    }

    pub fn set_weather(&mut self, weather: Weather) {
        self.weather = weather;
    }

    fn device(&self, id: &str) -> Result<&Device, SmartHomeError> {
        self.index
            .get(id)
            .map(|&position| &self.devices[position])
            .ok_or_else(|| not_found(id))
    }

    fn device_mut(&mut self, id: &str) -> Result<&mut Device, SmartHomeError> {
        match self.index.get(id) {
            Some(&position) => Ok(&mut self.devices[position]),
            None => Err(not_found(id)),
        }
    }
}

fn not_found(id: &str) -> SmartHomeError {
    NotFoundError {
        entity: "Device",
        id: id.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use std::future::Future;

    use smarthome_domain::error::ValidationError;
    use smarthome_domain::snapshot::DeviceEntry;

    use super::*;
    use crate::ports::StaticSource;

    struct FailingSource;

    impl SnapshotSource for FailingSource {
        fn fetch(&self) -> impl Future<Output = Result<HomeSnapshot, SmartHomeError>> + Send {
            async {
                Err(SmartHomeError::Load(Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "unreachable",
                ))))
            }
        }
    }

    fn registry() -> DeviceRegistry {
        DeviceRegistry::with_defaults()
    }

    fn builtin_ids() -> Vec<String> {
        HomeSnapshot::builtin()
            .device_ids()
            .map(ToString::to_string)
            .collect()
    }

    fn ids(registry: &DeviceRegistry) -> Vec<String> {
        registry.all_ids().iter().map(ToString::to_string).collect()
    }

    fn with_switch() -> HomeSnapshot {
        let mut snapshot = HomeSnapshot::builtin();
        snapshot.devices.push((
            "porch-camera".to_string(),
            DeviceEntry {
                kind: Some(DeviceKind::Switch),
                state: PowerState::On,
                ..DeviceEntry::default()
            },
        ));
        snapshot
    }

    #[test]
    fn should_list_ids_in_load_order() {
        assert_eq!(ids(&registry()), builtin_ids());
    }

    #[test]
    fn should_turn_light_on_when_brightness_set_positive() {
        let mut reg = registry();
        let outcome = reg.set_control_value("bedroom-light", 40).unwrap();
        assert_eq!(outcome.state, PowerState::On);
        assert_eq!(reg.get("bedroom-light").unwrap().state, PowerState::On);
    }

    #[test]
    fn should_turn_fan_off_when_speed_set_to_zero() {
        let mut reg = registry();
        let outcome = reg.set_control_value("living-room-fan", 0).unwrap();
        assert_eq!(
            outcome,
            ControlOutcome {
                value: 0,
                state: PowerState::Off,
            }
        );
    }

    #[test]
    fn should_clamp_light_brightness_both_ways() {
        let mut reg = registry();
        assert_eq!(reg.set_control_value("kitchen-light", 150).unwrap().value, 100);
        assert_eq!(reg.set_control_value("kitchen-light", -5).unwrap().value, 0);
        assert_eq!(reg.get("kitchen-light").unwrap().state, PowerState::Off);
    }

    #[test]
    fn should_clamp_fan_speed_to_high() {
        let mut reg = registry();
        let outcome = reg.set_control_value("bedroom-fan", 9).unwrap();
        assert_eq!(outcome.value, 3);
        assert_eq!(reg.power_usage("bedroom-fan").unwrap(), 90);
    }

    #[test]
    fn should_zero_light_when_toggled_off() {
        let mut reg = registry();
        assert_eq!(reg.toggle("living-room-light").unwrap(), PowerState::Off);
        assert_eq!(reg.get("living-room-light").unwrap().control_value, 0);
    }

    #[test]
    fn should_not_restore_brightness_after_toggle_off_and_on() {
        let mut reg = registry();
        reg.toggle("living-room-light").unwrap();
        reg.toggle("living-room-light").unwrap();
        let light = reg.get("living-room-light").unwrap();
        assert_eq!(light.state, PowerState::On);
        assert_eq!(light.control_value, 0);
    }

    #[test]
    fn should_restore_pair_after_double_toggle_when_device_starts_off() {
        let mut reg = registry();
        let before = reg.get("bedroom-fan").unwrap();
        reg.toggle("bedroom-fan").unwrap();
        reg.toggle("bedroom-fan").unwrap();
        let after = reg.get("bedroom-fan").unwrap();
        assert_eq!(
            (after.state, after.control_value),
            (before.state, before.control_value)
        );
    }

    #[test]
    fn should_turn_light_off_when_set_to_zero_after_toggle_on() {
        let mut reg = registry();
        assert_eq!(reg.toggle("bedroom-light").unwrap(), PowerState::On);
        assert_eq!(reg.get("bedroom-light").unwrap().control_value, 0);

        reg.set_control_value("bedroom-light", 0).unwrap();

        let light = reg.get("bedroom-light").unwrap();
        assert_eq!(light.state, PowerState::Off);
        assert_eq!(light.control_value, 0);
        assert_eq!(reg.power_usage("bedroom-light").unwrap(), 0);
    }

    #[test]
    fn should_keep_thermostat_temperature_across_toggles() {
        let mut reg = registry();
        reg.toggle("thermostat").unwrap();
        reg.toggle("thermostat").unwrap();
        let thermostat = reg.get("thermostat").unwrap();
        assert_eq!(thermostat.state, PowerState::On);
        assert_eq!(thermostat.control_value, 22);
    }

    #[test]
    fn should_switch_lights_off_when_security_set_to_away() {
        let mut reg = registry();
        let changed = reg.set_security_mode(SecurityMode::Away);

        let changed: Vec<&str> = changed.iter().map(DeviceId::as_str).collect();
        assert_eq!(changed, vec!["living-room-light", "kitchen-light"]);
        assert_eq!(reg.security_mode(), SecurityMode::Away);
        for device in reg.devices() {
            if device.kind == DeviceKind::Light {
                assert_eq!(device.state, PowerState::Off);
                assert_eq!(device.control_value, 0);
            }
        }
        assert_eq!(reg.get("living-room-fan").unwrap().state, PowerState::On);
        assert_eq!(reg.get("thermostat").unwrap().state, PowerState::On);
    }

    #[test]
    fn should_leave_devices_alone_when_security_set_to_home() {
        let mut reg = registry();
        let changed = reg.set_security_mode(SecurityMode::Home);
        assert!(changed.is_empty());
        assert_eq!(reg.get("kitchen-light").unwrap().state, PowerState::On);
    }

    #[test]
    fn should_leave_devices_alone_when_security_set_to_off() {
        let mut reg = registry();
        reg.set_security_mode(SecurityMode::Away);
        reg.toggle("kitchen-light").unwrap();

        let changed = reg.set_security_mode(SecurityMode::Off);

        assert!(changed.is_empty());
        assert_eq!(reg.security_mode(), SecurityMode::Off);
        assert_eq!(reg.get("kitchen-light").unwrap().state, PowerState::On);
        assert_eq!(reg.get("living-room-light").unwrap().state, PowerState::Off);
    }

    #[test]
    fn should_compute_power_usage_from_current_state() {
        let mut reg = registry();
        reg.set_control_value("living-room-light", 50).unwrap();
        reg.set_control_value("living-room-fan", 3).unwrap();
        reg.set_control_value("thermostat", 20).unwrap();
        assert_eq!(reg.power_usage("living-room-light").unwrap(), 30);
        assert_eq!(reg.power_usage("living-room-light").unwrap(), 30);
        assert_eq!(reg.power_usage("living-room-fan").unwrap(), 90);
        assert_eq!(reg.power_usage("thermostat").unwrap(), 700);
        assert_eq!(reg.power_usage("bedroom-light").unwrap(), 0);
    }

    #[test]
    fn should_sum_total_power_usage() {
        let reg = registry();
        // 80% light (48) + speed 2 fan (60) + 22°C thermostat (500) + 60% light (36)
        assert_eq!(reg.total_power_usage(), 644);
    }

    #[test]
    fn should_reject_unknown_id_and_stay_usable() {
        let mut reg = registry();
        assert!(matches!(reg.toggle("garage"), Err(SmartHomeError::NotFound(_))));
        assert!(matches!(
            reg.set_control_value("garage", 10),
            Err(SmartHomeError::NotFound(_))
        ));
        assert!(matches!(reg.get("garage"), Err(SmartHomeError::NotFound(_))));
        assert!(matches!(
            reg.power_usage("garage"),
            Err(SmartHomeError::NotFound(_))
        ));
        assert_eq!(reg.toggle("bedroom-light").unwrap(), PowerState::On);
    }

    #[test]
    fn should_reject_control_value_for_switch() {
        let mut reg = DeviceRegistry::from_snapshot(&with_switch()).unwrap();
        let result = reg.set_control_value("porch-camera", 1);
        assert!(matches!(
            result,
            Err(SmartHomeError::Validation(
                ValidationError::NoContinuousControl { .. }
            ))
        ));
        assert_eq!(reg.toggle("porch-camera").unwrap(), PowerState::Off);
    }

    #[test]
    fn should_return_copies_not_live_state() {
        let reg = registry();
        let mut copy = reg.get("kitchen-light").unwrap();
        copy.control_value = 5;
        assert_eq!(reg.get("kitchen-light").unwrap().control_value, 60);
    }

    #[test]
    fn should_keep_state_when_replace_fails() {
        let mut reg = registry();
        reg.toggle("kitchen-light").unwrap();

        let mut broken = HomeSnapshot::builtin();
        broken
            .devices
            .push(("mystery".to_string(), DeviceEntry::default()));

        assert!(reg.replace(&broken).is_err());
        assert_eq!(ids(&reg), builtin_ids());
        assert_eq!(reg.get("kitchen-light").unwrap().state, PowerState::Off);
    }

    #[test]
    fn should_group_devices_by_room() {
        let reg = registry();
        let rooms: Vec<String> = reg.rooms().iter().map(ToString::to_string).collect();
        assert_eq!(rooms, vec!["living-room", "bedroom", "kitchen"]);

        let bedroom: Vec<String> = reg
            .ids_in_room("bedroom")
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(bedroom, vec!["bedroom-light", "bedroom-fan"]);
        assert!(reg.ids_in_room("attic").is_empty());
    }

    #[test]
    fn should_reject_misaligned_energy_series() {
        let mut reg = registry();
        let series = EnergySeries {
            labels: vec!["Mon".to_string()],
            usage: vec![],
        };
        assert!(reg.set_energy(series).is_err());
        assert_eq!(reg.energy(), HomeSnapshot::builtin().energy);
    }

    #[test]
    fn should_replace_environment_series() {
        let mut reg = registry();
        let series =
            EnvironmentSeries::new(vec!["09:00".to_string()], vec![23.0], vec![]).unwrap();
        reg.set_environment(series.clone()).unwrap();
        assert_eq!(reg.environment(), series);
    }

    #[tokio::test]
    async fn should_apply_snapshot_from_source() {
        let snapshot: HomeSnapshot = serde_json::from_str(
            r#"{
                "devices": {
                    "study-fan": { "state": "off", "speed": 0 },
                    "hall-light": { "state": "on", "brightness": 30 }
                },
                "security": { "mode": "away" }
            }"#,
        )
        .unwrap();

        let mut reg = registry();
        let outcome = reg.load_from(&StaticSource::new(snapshot)).await;

        assert!(matches!(outcome, LoadOutcome::Loaded { devices: 2 }));
        assert_eq!(ids(&reg), vec!["study-fan", "hall-light"]);
        assert_eq!(reg.security_mode(), SecurityMode::Away);
        assert_eq!(reg.power_usage("hall-light").unwrap(), 18);
    }

    #[tokio::test]
    async fn should_fall_back_to_defaults_when_source_fails() {
        let mut reg = DeviceRegistry::default();
        let outcome = reg.load_from(&FailingSource).await;

        assert!(outcome.is_fallback());
        assert!(matches!(
            outcome,
            LoadOutcome::Fallback {
                reason: SmartHomeError::Load(_)
            }
        ));
        assert_eq!(ids(&reg), builtin_ids());
    }

    #[tokio::test]
    async fn should_fall_back_to_defaults_when_snapshot_is_malformed() {
        let mut snapshot = HomeSnapshot::builtin();
        snapshot.environment.temperature.pop();

        let mut reg = DeviceRegistry::default();
        let outcome = reg.load_from(&StaticSource::new(snapshot)).await;

        assert!(matches!(
            outcome,
            LoadOutcome::Fallback {
                reason: SmartHomeError::Validation(_)
            }
        ));
        assert_eq!(ids(&reg), builtin_ids());
        assert_eq!(reg.environment(), HomeSnapshot::builtin().environment);
    }
}
