//! Zone — a controllable room/area with lights and optionally a motion sensor.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::time::Timestamp;

/// Arena index of a zone inside its [`ZoneGraph`](crate::graph::ZoneGraph).
///
/// Assigned at graph construction; all occupancy bookkeeping is keyed by it
/// so corroboration lookups stay O(1) and never hold zone references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(usize);

impl ZoneId {
    #[must_use]
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "zone#{}", self.0)
    }
}

/// Bridge-assigned address of a single light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LightId(u32);

impl LightId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for LightId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a zone's motion events come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionSource {
    /// The zone has no motion sensing at all.
    None,
    /// A sensor with the given radio/pin address reports into this process.
    Sensor(u32),
    /// Motion is sensed by another process and reported by zone name.
    External,
}

impl MotionSource {
    /// Whether motion events can be attributed to this zone.
    #[must_use]
    pub fn is_motion_capable(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Per-zone reaction variant for entry motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorMode {
    /// Follow the circadian brightness as-is.
    #[default]
    Standard,
    /// Force full brightness even while the daytime event says "lights off".
    LightsOnDuringDay,
    /// Ignore motion entirely while guest mode is enabled.
    GuestSuppressed,
}

/// A controllable room: static configuration plus the mutable motion state
/// the engine maintains for it.
#[derive(Debug, Clone)]
pub struct Zone {
    pub name: String,
    pub lights: Vec<LightId>,
    pub motion_source: MotionSource,
    pub motion_timeout: chrono::Duration,
    /// Names of the zones a person leaving this zone walks into.
    pub exits_to: Vec<String>,
    pub behavior_mode: BehaviorMode,

    // Mutable motion state.
    pub motion_active: bool,
    pub last_motion: Option<Timestamp>,
    /// First motion seen in a downstream exit neighbor after this zone's own
    /// motion; reset by the zone's own next event. Diagnostic only.
    pub first_subsequent_neighbor_motion: Option<Timestamp>,
}

impl Zone {
    /// Create a builder for constructing a [`Zone`].
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ZoneBuilder {
        ZoneBuilder::new(name)
    }

    /// Record a motion start/stop event at `at`.
    pub fn record_motion(&mut self, at: Timestamp, is_start: bool) {
        self.last_motion = Some(at);
        self.motion_active = is_start;
        self.first_subsequent_neighbor_motion = None;
    }

    /// Time elapsed since the last motion, if any was ever seen.
    #[must_use]
    pub fn since_motion(&self, as_of: Timestamp) -> Option<chrono::Duration> {
        self.last_motion.map(|last| as_of - last)
    }

    /// Whether this zone can ever have its vacancy corroborated: it must
    /// exit into at least one other zone.
    #[must_use]
    pub fn participates_in_exit_graph(&self) -> bool {
        !self.exits_to.is_empty()
    }
}

/// Step-by-step builder for [`Zone`].
#[derive(Debug)]
pub struct ZoneBuilder {
    name: String,
    lights: Vec<LightId>,
    motion_source: MotionSource,
    motion_timeout: chrono::Duration,
    exits_to: Vec<String>,
    behavior_mode: BehaviorMode,
}

impl ZoneBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lights: Vec::new(),
            motion_source: MotionSource::None,
            motion_timeout: chrono::Duration::minutes(5),
            exits_to: Vec::new(),
            behavior_mode: BehaviorMode::default(),
        }
    }

    #[must_use]
    pub fn lights(mut self, lights: impl IntoIterator<Item = u32>) -> Self {
        self.lights = lights.into_iter().map(LightId::new).collect();
        self
    }

    #[must_use]
    pub fn sensor(mut self, addr: u32) -> Self {
        self.motion_source = MotionSource::Sensor(addr);
        self
    }

    #[must_use]
    pub fn external_sensor(mut self) -> Self {
        self.motion_source = MotionSource::External;
        self
    }

    #[must_use]
    pub fn motion_timeout(mut self, timeout: chrono::Duration) -> Self {
        self.motion_timeout = timeout;
        self
    }

    #[must_use]
    pub fn exits_to(mut self, zones: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exits_to = zones.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn behavior(mut self, mode: BehaviorMode) -> Self {
        self.behavior_mode = mode;
        self
    }

    /// Consume the builder, validate, and return a [`Zone`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyZoneName`] when the name is empty.
    pub fn build(self) -> Result<Zone, ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::EmptyZoneName);
        }
        Ok(Zone {
            name: self.name,
            lights: self.lights,
            motion_source: self.motion_source,
            motion_timeout: self.motion_timeout,
            exits_to: self.exits_to,
            behavior_mode: self.behavior_mode,
            motion_active: false,
            last_motion: None,
            first_subsequent_neighbor_motion: None,
        })
    }
}

/// Point-in-time view of a zone for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub name: String,
    pub lit: bool,
    pub occupied: bool,
}
