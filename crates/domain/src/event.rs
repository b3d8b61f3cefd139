//! Zone events — immutable records of engine decisions, broadcast for
//! status displays and diagnostics.

use serde::Serialize;

use crate::time::Timestamp;

/// Why the idle sweep powered a zone off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerOffReason {
    /// Nothing exits out of the zone, so a plain timeout suffices.
    NoExitNeighbors,
    /// A neighbor's motion corroborated the exit.
    CorroboratedExit,
    /// The long occupied-grace timeout expired without a corroborated exit.
    OccupiedGraceExpired,
}

impl std::fmt::Display for PowerOffReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoExitNeighbors => f.write_str("no exit neighbors"),
            Self::CorroboratedExit => f.write_str("corroborated exit"),
            Self::OccupiedGraceExpired => f.write_str("occupied grace expired"),
        }
    }
}

/// Something the engine decided or observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneEvent {
    MotionStarted {
        zone: String,
        at: Timestamp,
    },
    MotionStopped {
        zone: String,
        at: Timestamp,
    },
    /// Motion in `into` corroborated a person leaving `from`.
    ExitCorroborated {
        from: String,
        into: String,
        at: Timestamp,
    },
    ZonePoweredOff {
        zone: String,
        reason: PowerOffReason,
    },
    CircadianChanged {
        event: String,
    },
}
