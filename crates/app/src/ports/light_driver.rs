//! Light driver port — command transport to the light bridge.

use std::future::Future;

use lumo_domain::command::LightCommand;
use lumo_domain::error::DriverError;
use lumo_domain::zone::LightId;

/// Sends commands to, and queries power state from, the light hardware.
///
/// Implementations live in adapter crates. Dispatch failures are reported,
/// not retried: the engine's state reflects sensed reality even when a
/// hardware update fails, and the next event or sweep tick naturally
/// re-issues a command if state still differs.
pub trait LightDriver: Send + Sync {
    /// Apply `command` to every light in `lights`.
    fn set_command(
        &self,
        lights: &[LightId],
        command: &LightCommand,
    ) -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Whether the given light is currently powered on.
    ///
    /// Used to avoid redundant no-op commands.
    fn power_state(&self, light: LightId) -> impl Future<Output = Result<bool, DriverError>> + Send;
}

impl<T: LightDriver + Send + Sync> LightDriver for std::sync::Arc<T> {
    fn set_command(
        &self,
        lights: &[LightId],
        command: &LightCommand,
    ) -> impl Future<Output = Result<(), DriverError>> + Send {
        (**self).set_command(lights, command)
    }

    fn power_state(&self, light: LightId) -> impl Future<Output = Result<bool, DriverError>> + Send {
        (**self).power_state(light)
    }
}
