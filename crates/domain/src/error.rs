//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`LumoError`]
//! via `#[from]` (or an explicit `From` impl for adapter-local types).
//! Per-event and per-tick errors are isolated by the callers: a bad sensor
//! event must never take down the sweep, and vice versa.

/// Top-level error for the lumo engine and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum LumoError {
    /// Invalid static configuration. Fatal at startup only.
    #[error("configuration error")]
    Config(#[from] ConfigError),

    /// A sensor event arrived from an address no zone claims.
    #[error("no zone registered for sensor source {addr}")]
    UnknownSource { addr: u32 },

    /// A zone was referenced by a name the graph does not know.
    #[error("unknown zone '{name}'")]
    UnknownZone { name: String },

    /// The light bridge rejected or never answered a command.
    #[error("light driver error")]
    Driver(#[from] DriverError),

    /// The flag/timestamp store is unreachable. Callers degrade to safe
    /// defaults: flags read `false`, last-motion reads `None`.
    #[error("persisted state unavailable")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LumoError {
    /// Wrap an adapter-level storage failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Static-configuration validation failures.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("zone name must not be empty")]
    EmptyZoneName,

    #[error("duplicate zone name '{0}'")]
    DuplicateZone(String),

    #[error("sensor source {addr} is claimed by both '{first}' and '{second}'")]
    DuplicateSource {
        addr: u32,
        first: String,
        second: String,
    },

    #[error("zone '{zone}' has an exit edge to undefined zone '{target}'")]
    UndefinedZone { zone: String, target: String },

    #[error("zone '{zone}' participates in the exit graph but has no motion source")]
    NoMotionCapability { zone: String },

    #[error("at least one zone needs a motion source")]
    NoMotionCapableZones,

    #[error("circadian schedule must contain at least one event")]
    EmptySchedule,

    #[error("circadian events '{first}' and '{second}' trigger out of order")]
    UnorderedSchedule { first: String, second: String },

    #[error("coordinates ({latitude}, {longitude}) are outside the valid range")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("cloud cover threshold {0} is outside [0, 1]")]
    InvalidCloudCover(f64),
}

/// Errors reported by a light-driver implementation.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The bridge did not answer within the configured deadline.
    #[error("bridge request timed out")]
    Timeout,

    /// The bridge could not be reached at all.
    #[error("bridge unreachable: {0}")]
    Unreachable(String),

    /// The bridge answered with an error.
    #[error("bridge rejected command: {0}")]
    Bridge(String),
}
