//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `lumo.toml` in the working directory. Every field has a
//! sensible default so the file is optional; the default zone table and
//! circadian schedule describe a small five-room home, good enough to run
//! the daemon against the virtual light driver. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use lumo_app::engine::EngineSettings;
use lumo_app::routines::RoutineSettings;
use lumo_domain::circadian::{
    CircadianEvent, Location, Schedule, SolarAnchor, TriggerTime, Validity,
};
use lumo_domain::color::ColorPoint;
use lumo_domain::graph::ZoneGraph;
use lumo_domain::zone::{BehaviorMode, Zone};

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Light bridge settings.
    pub bridge: BridgeConfig,
    /// Sensor relay listener settings.
    pub sensors: SensorConfig,
    /// Site coordinates and timezone for solar trigger times.
    pub location: LocationConfig,
    /// Motion processing tunables.
    pub motion: MotionConfig,
    /// Arrival/wake-up routine settings.
    pub routines: RoutinesConfig,
    /// The zone table.
    #[serde(rename = "zone")]
    pub zones: Vec<ZoneConfig>,
    /// The circadian event table, ascending by trigger time.
    #[serde(rename = "circadian")]
    pub circadian: Vec<CircadianEventConfig>,
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

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Light bridge configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bridge base URL.
    pub base_url: String,
    /// Registered bridge API username.
    pub username: String,
    /// Use the in-memory driver instead of real hardware.
    pub virtual_enabled: bool,
    /// Per-request deadline in milliseconds.
    pub timeout_millis: u64,
}

/// Sensor relay listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// UDP address the radio relay sends frames to.
    pub listen: String,
}

/// Site location configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// IANA timezone name, e.g. `America/Los_Angeles`.
    pub timezone: String,
}

/// Motion processing tunables.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Max gap between source and destination motion for a corroborated exit.
    pub corroboration_window_secs: u64,
    /// Extended timeout for zones stuck "occupied" without an exit.
    pub occupied_grace_secs: u64,
    /// Deadline for one light-driver dispatch.
    pub dispatch_timeout_millis: u64,
}

/// Arrival/wake-up routine configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RoutinesConfig {
    pub arrival_zone: String,
    pub arrival_hold_secs: u64,
    pub wakeup_zone: String,
    pub wakeup_fade_secs: u64,
    pub vacation_reference_zone: String,
    pub vacation_after_hours: u64,
}

/// One zone definition.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    #[serde(default)]
    pub lights: Vec<u32>,
    /// Radio/pin address of the zone's own sensor.
    #[serde(default)]
    pub sensor: Option<u32>,
    /// Motion is reported by another process, by zone name.
    #[serde(default)]
    pub external: bool,
    #[serde(default = "default_zone_timeout_secs")]
    pub motion_timeout_secs: u64,
    #[serde(default)]
    pub exits_to: Vec<String>,
    #[serde(default)]
    pub behavior: BehaviorMode,
}

fn default_zone_timeout_secs() -> u64 {
    300
}

/// One circadian event definition. Exactly one of `at` (wall clock) or
/// `anchor` (sun-relative) must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct CircadianEventConfig {
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub brightness: u8,
    /// Wall-clock trigger, `HH:MM`.
    #[serde(default)]
    pub at: Option<String>,
    /// Sun-relative trigger.
    #[serde(default)]
    pub anchor: Option<SolarAnchor>,
    #[serde(default)]
    pub offset_minutes: i64,
    /// Skip the event entirely when cloud cover exceeds this fraction.
    #[serde(default)]
    pub max_cloud_cover: Option<f64>,
}

impl Config {
    /// Load configuration from `lumo.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or a
    /// semantic check fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("lumo.toml")?;
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
        if let Ok(val) = std::env::var("LUMO_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("LUMO_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("LUMO_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("LUMO_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("LUMO_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.zones.is_empty() {
            return Err(ConfigError::Validation(
                "at least one zone must be configured".to_string(),
            ));
        }
        if self.circadian.is_empty() {
            return Err(ConfigError::Validation(
                "at least one circadian event must be configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Build the validated zone graph.
    ///
    /// # Errors
    ///
    /// Returns a domain [`ConfigError`](lumo_domain::error::ConfigError)
    /// wrapped in [`ConfigError::Domain`] when the zone table is invalid.
    pub fn build_graph(&self) -> Result<ZoneGraph, ConfigError> {
        let zones = self
            .zones
            .iter()
            .map(ZoneConfig::to_zone)
            .collect::<Result<Vec<_>, _>>()?;
        ZoneGraph::new(zones).map_err(ConfigError::from)
    }

    /// Build the site location.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an unknown timezone and
    /// [`ConfigError::Domain`] for out-of-range coordinates.
    pub fn build_location(&self) -> Result<Location, ConfigError> {
        let timezone = self.location.timezone.parse::<chrono_tz::Tz>().map_err(|_| {
            ConfigError::Validation(format!("unknown timezone '{}'", self.location.timezone))
        })?;
        Location::new(self.location.latitude, self.location.longitude, timezone)
            .map_err(ConfigError::from)
    }

    /// Build the validated circadian schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an event has neither (or both) trigger
    /// forms, or the table fails schedule validation.
    pub fn build_schedule(&self) -> Result<Schedule, ConfigError> {
        let events = self
            .circadian
            .iter()
            .map(CircadianEventConfig::to_event)
            .collect::<Result<Vec<_>, _>>()?;
        Schedule::new(events, self.build_location()?).map_err(ConfigError::from)
    }

    /// Engine tunables.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            corroboration_window: chrono::Duration::seconds(to_i64(
                self.motion.corroboration_window_secs,
            )),
            occupied_grace: chrono::Duration::seconds(to_i64(self.motion.occupied_grace_secs)),
            dispatch_timeout: std::time::Duration::from_millis(self.motion.dispatch_timeout_millis),
        }
    }

    /// Routine settings.
    #[must_use]
    pub fn routine_settings(&self) -> RoutineSettings {
        RoutineSettings {
            arrival_zone: self.routines.arrival_zone.clone(),
            arrival_hold: std::time::Duration::from_secs(self.routines.arrival_hold_secs),
            wakeup_zone: self.routines.wakeup_zone.clone(),
            wakeup_fade: std::time::Duration::from_secs(self.routines.wakeup_fade_secs),
            vacation_reference_zone: self.routines.vacation_reference_zone.clone(),
            vacation_after: chrono::Duration::hours(to_i64(self.routines.vacation_after_hours)),
        }
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl ZoneConfig {
    fn to_zone(&self) -> Result<Zone, ConfigError> {
        let mut builder = Zone::builder(&self.name)
            .lights(self.lights.iter().copied())
            .motion_timeout(chrono::Duration::seconds(to_i64(self.motion_timeout_secs)))
            .exits_to(self.exits_to.iter().cloned())
            .behavior(self.behavior);
        if let Some(addr) = self.sensor {
            builder = builder.sensor(addr);
        } else if self.external {
            builder = builder.external_sensor();
        }
        builder.build().map_err(ConfigError::from)
    }
}

impl CircadianEventConfig {
    fn to_event(&self) -> Result<CircadianEvent, ConfigError> {
        let trigger = match (&self.at, self.anchor) {
            (Some(at), None) => {
                let time = chrono::NaiveTime::parse_from_str(at, "%H:%M")
                    .or_else(|_| chrono::NaiveTime::parse_from_str(at, "%H:%M:%S"))
                    .map_err(|_| {
                        ConfigError::Validation(format!(
                            "circadian event '{}' has unparseable time '{at}'",
                            self.name
                        ))
                    })?;
                TriggerTime::Clock(time)
            }
            (None, Some(anchor)) => TriggerTime::Solar {
                anchor,
                offset_minutes: self.offset_minutes,
            },
            _ => {
                return Err(ConfigError::Validation(format!(
                    "circadian event '{}' needs exactly one of 'at' or 'anchor'",
                    self.name
                )));
            }
        };

        Ok(CircadianEvent {
            name: self.name.clone(),
            color: ColorPoint::new(self.x, self.y),
            brightness: self.brightness,
            trigger,
            validity: self
                .max_cloud_cover
                .map_or(Validity::Always, Validity::MaxCloudCover),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            bridge: BridgeConfig::default(),
            sensors: SensorConfig::default(),
            location: LocationConfig::default(),
            motion: MotionConfig::default(),
            routines: RoutinesConfig::default(),
            zones: default_zones(),
            circadian: default_circadian(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:lumo.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "lumod=info,lumo=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.1.104".to_string(),
            username: "lumod".to_string(),
            virtual_enabled: true,
            timeout_millis: 2000,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:5005".to_string(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: 37.877_881,
            longitude: -122.269_312,
            timezone: "America/Los_Angeles".to_string(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            corroboration_window_secs: 20,
            occupied_grace_secs: 2 * 60 * 60,
            dispatch_timeout_millis: 2000,
        }
    }
}

impl Default for RoutinesConfig {
    fn default() -> Self {
        Self {
            arrival_zone: "Stairway".to_string(),
            arrival_hold_secs: 20 * 60,
            wakeup_zone: "Bedroom".to_string(),
            wakeup_fade_secs: 30 * 60,
            vacation_reference_zone: "Hallway".to_string(),
            vacation_after_hours: 12,
        }
    }
}

fn default_zones() -> Vec<ZoneConfig> {
    let zone = |name: &str,
                lights: &[u32],
                sensor: Option<u32>,
                external: bool,
                timeout_secs: u64,
                exits_to: &[&str]| ZoneConfig {
        name: name.to_string(),
        lights: lights.to_vec(),
        sensor,
        external,
        motion_timeout_secs: timeout_secs,
        exits_to: exits_to.iter().map(ToString::to_string).collect(),
        behavior: BehaviorMode::Standard,
    };

    vec![
        zone("Living Room", &[1, 2, 3], Some(17), false, 20 * 60, &["Hallway"]),
        zone("Hallway", &[14], Some(27), false, 5 * 60, &[]),
        zone("Kitchen", &[16, 17, 19], Some(4), false, 5 * 60, &["Hallway"]),
        zone("Bedroom", &[4, 7, 15, 18], None, true, 30 * 60, &[]),
        zone("Stairway", &[13], None, false, 300, &[]),
    ]
}

fn default_circadian() -> Vec<CircadianEventConfig> {
    let event = |name: &str, (x, y): (f64, f64), brightness: u8| CircadianEventConfig {
        name: name.to_string(),
        x,
        y,
        brightness,
        at: None,
        anchor: None,
        offset_minutes: 0,
        max_cloud_cover: None,
    };

    const DUSK_XY: (f64, f64) = (0.5304, 0.4068);
    const SUNSET_XY: (f64, f64) = (0.4904, 0.4075);
    const DAYLIGHT_XY: (f64, f64) = (0.4506, 0.4081);

    vec![
        CircadianEventConfig {
            at: Some("00:00".to_string()),
            ..event("night", DUSK_XY, 254)
        },
        CircadianEventConfig {
            anchor: Some(SolarAnchor::Dawn),
            ..event("dawn", SUNSET_XY, 200)
        },
        CircadianEventConfig {
            anchor: Some(SolarAnchor::Sunrise),
            offset_minutes: 30,
            max_cloud_cover: Some(0.5),
            ..event("daylight", DAYLIGHT_XY, 0)
        },
        CircadianEventConfig {
            anchor: Some(SolarAnchor::Sunset),
            ..event("sunset", SUNSET_XY, 254)
        },
        CircadianEventConfig {
            anchor: Some(SolarAnchor::Dusk),
            ..event("dusk", DUSK_XY, 254)
        },
    ]
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
    /// Zone graph or schedule validation failure.
    #[error(transparent)]
    Domain(#[from] lumo_domain::error::ConfigError),
}
