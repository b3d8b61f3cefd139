//! Flag store port — persisted operating-mode toggles.

use std::future::Future;
use std::str::FromStr;

use lumo_domain::error::LumoError;

/// The operating-mode flags shared with other processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// Master switch for motion-driven lighting.
    MotionEnabled,
    /// Guests present: zones tagged guest-suppressed ignore motion.
    GuestMode,
    /// Party: every zone ignores motion.
    PartyMode,
    /// Nobody home for an extended period; gates the wake-up routine.
    VacationMode,
}

impl Flag {
    /// Stable storage key for the flag.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::MotionEnabled => "motion_enabled",
            Self::GuestMode => "guest_mode",
            Self::PartyMode => "party_mode",
            Self::VacationMode => "vacation_mode",
        }
    }
}

impl FromStr for Flag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "motion_enabled" => Ok(Self::MotionEnabled),
            "guest_mode" => Ok(Self::GuestMode),
            "party_mode" => Ok(Self::PartyMode),
            "vacation_mode" => Ok(Self::VacationMode),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Best-effort external flag state. Readers treat a failure as `false`.
pub trait FlagStore: Send + Sync {
    fn flag(&self, flag: Flag) -> impl Future<Output = Result<bool, LumoError>> + Send;

    fn set_flag(&self, flag: Flag, value: bool)
    -> impl Future<Output = Result<(), LumoError>> + Send;
}

impl<T: FlagStore + Send + Sync> FlagStore for std::sync::Arc<T> {
    fn flag(&self, flag: Flag) -> impl Future<Output = Result<bool, LumoError>> + Send {
        (**self).flag(flag)
    }

    fn set_flag(
        &self,
        flag: Flag,
        value: bool,
    ) -> impl Future<Output = Result<(), LumoError>> + Send {
        (**self).set_flag(flag, value)
    }
}
