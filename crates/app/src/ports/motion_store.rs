//! Motion store port — persisted last-motion timestamps.
//!
//! Externally-sensed zones have their transient motion state maintained by
//! another process; this port is how their timestamps reach the engine, and
//! how the engine shares its own.

use std::future::Future;

use lumo_domain::error::LumoError;
use lumo_domain::time::Timestamp;

/// Best-effort persisted last-motion timestamps, keyed by zone name.
/// Readers treat a failure as "never seen motion".
pub trait MotionStore: Send + Sync {
    fn last_motion(
        &self,
        zone: &str,
    ) -> impl Future<Output = Result<Option<Timestamp>, LumoError>> + Send;

    fn set_last_motion(
        &self,
        zone: &str,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), LumoError>> + Send;
}

impl<T: MotionStore + Send + Sync> MotionStore for std::sync::Arc<T> {
    fn last_motion(
        &self,
        zone: &str,
    ) -> impl Future<Output = Result<Option<Timestamp>, LumoError>> + Send {
        (**self).last_motion(zone)
    }

    fn set_last_motion(
        &self,
        zone: &str,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), LumoError>> + Send {
        (**self).set_last_motion(zone, at)
    }
}
