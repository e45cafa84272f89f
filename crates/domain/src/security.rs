//! Security system mode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Global security setting of the home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    #[default]
    Off,
    Home,
    Away,
}

impl SecurityMode {
    /// Whether entering this mode switches every light off.
    #[must_use]
    pub fn forces_lights_off(self) -> bool {
        matches!(self, Self::Away)
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::Home => f.write_str("home"),
            Self::Away => f.write_str("away"),
        }
    }
}

/// Error returned when parsing an unknown security mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown security mode: {0}")]
pub struct UnknownSecurityMode(pub String);

impl FromStr for SecurityMode {
    type Err = UnknownSecurityMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "home" => Ok(Self::Home),
            "away" => Ok(Self::Away),
            _ => Err(UnknownSecurityMode(s.to_string())),
        }
    }
}

/// Security section of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySystem {
    pub mode: SecurityMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_only_force_lights_off_when_away() {
        assert!(SecurityMode::Away.forces_lights_off());
        assert!(!SecurityMode::Home.forces_lights_off());
        assert!(!SecurityMode::Off.forces_lights_off());
    }

    #[test]
    fn should_parse_mode_case_insensitively() {
        assert_eq!("AWAY".parse::<SecurityMode>(), Ok(SecurityMode::Away));
        assert_eq!(" home ".parse::<SecurityMode>(), Ok(SecurityMode::Home));
    }

    #[test]
    fn should_reject_unknown_mode() {
        let err = "vacation".parse::<SecurityMode>().unwrap_err();
        assert_eq!(err.to_string(), "unknown security mode: vacation");
    }

    #[test]
    fn should_default_security_system_to_off() {
        let system: SecuritySystem = serde_json::from_str("{}").unwrap();
        assert_eq!(system.mode, SecurityMode::Off);
    }
}
