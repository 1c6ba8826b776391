//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `zonehub.toml` in the working directory. Server, logging, and
//! storage sections have defaults so a minimal file only declares entries.
//! Environment variables take precedence over file values. All entry
//! configuration is validated here, at load time — the control loop never
//! sees an invalid configuration.

use serde::Deserialize;

use zonehub_domain::contact::{ContactKind, ContactSensor};
use zonehub_domain::entry::EntryConfig;
use zonehub_domain::error::ZoneHubError;
use zonehub_domain::id::{EntryId, RoomId, SensorId};
use zonehub_domain::policy::{EcoPolicy, TsrPolicy};
use zonehub_domain::room::{OccupancySensor, OccupancySensorKind, Room, Vent};
use zonehub_domain::settings::ControlSettings;
use zonehub_domain::snapshot::StateSnapshot;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// State persistence settings.
    pub storage: StorageConfig,
    /// Seed states for the simulated host.
    pub initial_states: Vec<InitialState>,
    /// Control loop entries (one per thermostat).
    pub entries: Vec<EntryDef>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// State persistence configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the per-entry JSON snapshots.
    pub dir: String,
}

/// Seed state for one simulated host entity.
#[derive(Debug, Clone, Deserialize)]
pub struct InitialState {
    pub entity: String,
    pub state: String,
    #[serde(default)]
    pub attributes: toml::Table,
}

impl InitialState {
    /// Convert into a host snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when an attribute value cannot be
    /// represented as JSON.
    pub fn snapshot(&self) -> Result<StateSnapshot, ConfigError> {
        let mut snapshot = StateSnapshot::new(self.state.clone());
        for (key, value) in &self.attributes {
            let json = serde_json::to_value(value).map_err(|err| {
                ConfigError::Validation(format!("attribute {key} of {}: {err}", self.entity))
            })?;
            snapshot.attributes.insert(key.clone(), json);
        }
        Ok(snapshot)
    }
}

/// One control loop entry as written in TOML.
#[derive(Debug, Deserialize)]
pub struct EntryDef {
    pub id: String,
    pub name: Option<String>,
    pub thermostat: String,
    /// Binary sensor that is `on` while the household is away.
    pub away_sensor: Option<String>,
    #[serde(default)]
    pub respect_user_off: bool,
    #[serde(default)]
    pub contact_sensors: Vec<ContactSensorDef>,
    #[serde(default)]
    pub rooms: Vec<RoomDef>,
    #[serde(default)]
    pub settings: ControlSettings,
    #[serde(default)]
    pub eco: EcoPolicy,
    #[serde(default)]
    pub tsr: TsrPolicy,
}

#[derive(Debug, Deserialize)]
pub struct ContactSensorDef {
    pub id: String,
    /// Door/window; inferred from the entity id when omitted.
    pub kind: Option<ContactKind>,
}

#[derive(Debug, Deserialize)]
pub struct RoomDef {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub occupancy_sensors: Vec<OccupancySensorDef>,
    #[serde(default)]
    pub temperature_sensors: Vec<String>,
    #[serde(default)]
    pub vents: Vec<VentDef>,
    #[serde(default)]
    pub tracked_for_eco: bool,
    #[serde(default)]
    pub tracked_for_tsr: bool,
    #[serde(default)]
    pub force_track_when_critical: bool,
    pub vent_open_delay_seconds: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct OccupancySensorDef {
    pub id: String,
    /// Binary (live state) or derived (`previous_valid_state` attribute).
    pub kind: Option<OccupancySensorKind>,
}

#[derive(Debug, Deserialize)]
pub struct VentDef {
    pub id: String,
    /// Member count for vent groups.
    pub members: Option<u32>,
}

impl EntryDef {
    /// Build the validated domain configuration.
    fn to_entry_config(&self) -> EntryConfig {
        EntryConfig {
            id: EntryId::from(self.id.as_str()),
            name: self.name.clone().unwrap_or_else(|| self.id.clone()),
            thermostat: SensorId::from(self.thermostat.as_str()),
            away_sensor: self
                .away_sensor
                .as_deref()
                .map(SensorId::from),
            contact_sensors: self
                .contact_sensors
                .iter()
                .map(|def| match def.kind {
                    Some(kind) => ContactSensor::new(def.id.as_str(), kind),
                    None => ContactSensor::inferred(def.id.as_str()),
                })
                .collect(),
            rooms: self.rooms.iter().map(RoomDef::to_room).collect(),
            settings: self.settings.clone(),
            eco: self.eco.clone(),
            tsr: self.tsr.clone(),
            respect_user_off: self.respect_user_off,
        }
    }
}

impl RoomDef {
    fn to_room(&self) -> Room {
        Room {
            id: RoomId::from(self.id.as_str()),
            name: self.name.clone().unwrap_or_else(|| self.id.clone()),
            occupancy_sensors: self
                .occupancy_sensors
                .iter()
                .map(|def| OccupancySensor {
                    id: SensorId::from(def.id.as_str()),
                    kind: def.kind.unwrap_or_default(),
                })
                .collect(),
            temperature_sensors: self
                .temperature_sensors
                .iter()
                .map(|id| SensorId::from(id.as_str()))
                .collect(),
            vents: self
                .vents
                .iter()
                .map(|def| Vent {
                    id: def.id.as_str().into(),
                    members: def.members.unwrap_or(1),
                })
                .collect(),
            tracked_for_eco: self.tracked_for_eco,
            tracked_for_tsr: self.tracked_for_tsr,
            force_track_when_critical: self.force_track_when_critical,
            vent_open_delay_seconds: self.vent_open_delay_seconds,
        }
    }
}

impl Config {
    /// Load configuration from `zonehub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if any
    /// entry breaks a domain invariant.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("zonehub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ZONEHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("ZONEHUB_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("ZONEHUB_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("ZONEHUB_STATE_DIR") {
            self.storage.dir = val;
        }
        if let Ok(val) = std::env::var("ZONEHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    /// Check semantic invariants across the whole file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero port, duplicate entry ids, or an
    /// entry that fails domain validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        let mut seen = std::collections::BTreeSet::new();
        for entry in &self.entries {
            if !seen.insert(&entry.id) {
                return Err(ConfigError::Validation(format!(
                    "duplicate entry id: {}",
                    entry.id
                )));
            }
            entry.to_entry_config().validate()?;
        }
        Ok(())
    }

    /// Validated domain configurations, one per entry.
    #[must_use]
    pub fn entry_configs(&self) -> Vec<EntryConfig> {
        self.entries.iter().map(EntryDef::to_entry_config).collect()
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "zonehubd=info,zonehub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: ".zonehub/state".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// An entry broke a domain invariant.
    #[error("invalid entry configuration")]
    Entry(#[from] ZoneHubError),
}
