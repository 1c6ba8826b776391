//! HVAC operating mode.

use serde::{Deserialize, Serialize};

/// Operating mode of the controlled thermostat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    Heat,
    Cool,
    HeatCool,
    Off,
}

impl HvacMode {
    /// Whether this mode calls for conditioning (anything but [`Off`](Self::Off)).
    #[must_use]
    pub fn is_on(self) -> bool {
        self != Self::Off
    }

    /// Parse a host-reported mode string, returning `None` for anything
    /// unrecognised (including `unknown`/`unavailable`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "heat" => Some(Self::Heat),
            "cool" => Some(Self::Cool),
            "heat_cool" | "auto" => Some(Self::HeatCool),
            "off" => Some(Self::Off),
            _ => None,
        }
    }
}

impl std::fmt::Display for HvacMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Heat => f.write_str("heat"),
            Self::Cool => f.write_str("cool"),
            Self::HeatCool => f.write_str("heat_cool"),
            Self::Off => f.write_str("off"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_report_on_for_conditioning_modes() {
        assert!(HvacMode::Heat.is_on());
        assert!(HvacMode::Cool.is_on());
        assert!(HvacMode::HeatCool.is_on());
        assert!(!HvacMode::Off.is_on());
    }

    #[test]
    fn should_parse_known_mode_strings() {
        assert_eq!(HvacMode::parse("heat"), Some(HvacMode::Heat));
        assert_eq!(HvacMode::parse("cool"), Some(HvacMode::Cool));
        assert_eq!(HvacMode::parse("heat_cool"), Some(HvacMode::HeatCool));
        assert_eq!(HvacMode::parse("auto"), Some(HvacMode::HeatCool));
        assert_eq!(HvacMode::parse("off"), Some(HvacMode::Off));
    }

    #[test]
    fn should_return_none_for_unknown_mode_strings() {
        assert_eq!(HvacMode::parse("unavailable"), None);
        assert_eq!(HvacMode::parse("unknown"), None);
        assert_eq!(HvacMode::parse("dry"), None);
    }

    #[test]
    fn should_display_snake_case() {
        assert_eq!(HvacMode::HeatCool.to_string(), "heat_cool");
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let json = serde_json::to_string(&HvacMode::HeatCool).unwrap();
        assert_eq!(json, "\"heat_cool\"");
        let parsed: HvacMode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, HvacMode::HeatCool);
    }
}
