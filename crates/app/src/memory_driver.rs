//! In-memory light driver for development runs and tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use lumo_domain::command::LightCommand;
use lumo_domain::error::DriverError;
use lumo_domain::zone::LightId;

use crate::ports::LightDriver;

/// A [`LightDriver`] that tracks light state in memory and records every
/// command it receives. Stands in for the bridge when no hardware is
/// configured.
#[derive(Debug, Default)]
pub struct MemoryLightDriver {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    powered: HashMap<LightId, bool>,
    sent: Vec<(Vec<LightId>, LightCommand)>,
}

impl MemoryLightDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command sent so far, oldest first.
    #[must_use]
    pub fn sent_commands(&self) -> Vec<(Vec<LightId>, LightCommand)> {
        self.lock().sent.clone()
    }

    /// Whether the given light is currently on.
    #[must_use]
    pub fn is_on(&self, light: LightId) -> bool {
        self.lock().powered.get(&light).copied().unwrap_or(false)
    }

    /// Preset a light's power state without recording a command.
    pub fn set_power(&self, light: LightId, on: bool) {
        self.lock().powered.insert(light, on);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl LightDriver for MemoryLightDriver {
    fn set_command(
        &self,
        lights: &[LightId],
        command: &LightCommand,
    ) -> impl Future<Output = Result<(), DriverError>> + Send {
        let mut inner = self.lock();
        if let Some(on) = command.on {
            for light in lights {
                inner.powered.insert(*light, on);
            }
        }
        inner.sent.push((lights.to_vec(), command.clone()));
        tracing::debug!(?lights, ?command, "virtual light command");
        async { Ok(()) }
    }

    fn power_state(&self, light: LightId) -> impl Future<Output = Result<bool, DriverError>> + Send {
        let on = self.is_on(light);
        async move { Ok(on) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_track_power_state_from_commands() {
        let driver = MemoryLightDriver::new();
        let lights = [LightId::new(1), LightId::new(2)];

        driver
            .set_command(&lights, &LightCommand::full_on())
            .await
            .unwrap();
        assert!(driver.power_state(LightId::new(1)).await.unwrap());
        assert!(driver.power_state(LightId::new(2)).await.unwrap());

        driver
            .set_command(&lights[..1], &LightCommand::off())
            .await
            .unwrap();
        assert!(!driver.power_state(LightId::new(1)).await.unwrap());
        assert!(driver.power_state(LightId::new(2)).await.unwrap());
    }

    #[tokio::test]
    async fn should_default_unknown_lights_to_off() {
        let driver = MemoryLightDriver::new();
        assert!(!driver.power_state(LightId::new(42)).await.unwrap());
    }

    #[tokio::test]
    async fn should_record_commands_in_order() {
        let driver = MemoryLightDriver::new();
        let lights = [LightId::new(7)];

        driver
            .set_command(&lights, &LightCommand::on())
            .await
            .unwrap();
        driver
            .set_command(&lights, &LightCommand::off())
            .await
            .unwrap();

        let sent = driver.sent_commands();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1, LightCommand::on());
        assert_eq!(sent[1].1, LightCommand::off());
    }
}
