//! One-shot lighting routines: arrival and wake-up.
//!
//! Arrival holds a zone at full brightness for a fixed period, then powers
//! it off. Wake-up fades the bedroom from a dim warm white to full daylight
//! unless nobody has been home for a long time (vacation) or the room is
//! already lit.

use std::sync::atomic::Ordering;

use lumo_domain::color;
use lumo_domain::command::{FULL_BRIGHTNESS, LightCommand};
use lumo_domain::error::LumoError;
use lumo_domain::time::now;

use crate::engine::Engine;
use crate::ports::{EventPublisher, Flag, FlagStore, LightDriver, MotionStore, WeatherProvider};

/// Configuration for the arrival and wake-up routines.
#[derive(Debug, Clone)]
pub struct RoutineSettings {
    /// Zone lit when someone arrives home.
    pub arrival_zone: String,
    /// How long the arrival zone stays on.
    pub arrival_hold: std::time::Duration,
    /// Zone the wake-up fade targets.
    pub wakeup_zone: String,
    /// Length of the wake-up fade to full daylight.
    pub wakeup_fade: std::time::Duration,
    /// Zone whose motion decides whether anyone is home.
    pub vacation_reference_zone: String,
    /// Motionless period in the reference zone that flips vacation mode on.
    pub vacation_after: chrono::Duration,
}

impl Default for RoutineSettings {
    fn default() -> Self {
        Self {
            arrival_zone: "Stairway".to_string(),
            arrival_hold: std::time::Duration::from_secs(20 * 60),
            wakeup_zone: "Bedroom".to_string(),
            wakeup_fade: std::time::Duration::from_secs(30 * 60),
            vacation_reference_zone: "Hallway".to_string(),
            vacation_after: chrono::Duration::hours(12),
        }
    }
}

/// What the arrival routine did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalOutcome {
    Performed,
    /// A previous arrival is still holding the lights; this one is a no-op.
    AlreadyRunning,
}

/// What the wake-up routine did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeupOutcome {
    Performed,
    OnVacation,
    AlreadyLit,
}

impl<L, F, M, W, P> Engine<L, F, M, W, P>
where
    L: LightDriver,
    F: FlagStore,
    M: MotionStore,
    W: WeatherProvider,
    P: EventPublisher + Send + Sync,
{
    /// Light the arrival zone at full brightness, hold, then power it off.
    ///
    /// Concurrent invocations are no-ops while one is holding.
    ///
    /// # Errors
    ///
    /// Returns [`LumoError::UnknownZone`] when the configured arrival zone
    /// does not exist.
    pub async fn perform_arrival(
        &self,
        settings: &RoutineSettings,
    ) -> Result<ArrivalOutcome, LumoError> {
        if self.arrival_active.swap(true, Ordering::SeqCst) {
            tracing::info!("aborting arrival: already running");
            return Ok(ArrivalOutcome::AlreadyRunning);
        }

        let result = self.arrival_inner(settings).await;
        self.arrival_active.store(false, Ordering::SeqCst);
        result.map(|()| ArrivalOutcome::Performed)
    }

    async fn arrival_inner(&self, settings: &RoutineSettings) -> Result<(), LumoError> {
        let lights = self.zone_lights(&settings.arrival_zone)?;
        tracing::info!(zone = %settings.arrival_zone, "performing arrival");

        self.dispatch(&lights, &LightCommand::full_on()).await;
        tokio::time::sleep(settings.arrival_hold).await;
        self.dispatch(&lights, &LightCommand::off()).await;
        Ok(())
    }

    /// Fade the wake-up zone from dim warm white to full daylight.
    ///
    /// Skipped while vacation mode holds (no motion in the reference zone
    /// for the configured period) or when the zone is already lit.
    ///
    /// # Errors
    ///
    /// Returns [`LumoError::UnknownZone`] when the configured wake-up zone
    /// does not exist.
    pub async fn perform_wakeup(
        &self,
        settings: &RoutineSettings,
    ) -> Result<WakeupOutcome, LumoError> {
        if self.refresh_vacation_mode(settings).await {
            tracing::info!("aborting wakeup: on vacation");
            return Ok(WakeupOutcome::OnVacation);
        }

        let lights = self.zone_lights(&settings.wakeup_zone)?;
        if !self.already_dark(&lights).await {
            tracing::info!(zone = %settings.wakeup_zone, "aborting wakeup: already lit");
            return Ok(WakeupOutcome::AlreadyLit);
        }

        let warm = LightCommand::on()
            .with_brightness(1)
            .with_color(color::SUNSET);
        self.dispatch(&lights, &warm).await;
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;

        let fade = LightCommand::default()
            .with_brightness(FULL_BRIGHTNESS)
            .with_color(color::DAYLIGHT)
            .with_transition(settings.wakeup_fade);
        self.dispatch(&lights, &fade).await;

        tracing::info!(zone = %settings.wakeup_zone, "performed wakeup");
        Ok(WakeupOutcome::Performed)
    }

    /// Recompute and persist vacation mode from the reference zone's last
    /// motion. Returns the new value.
    pub async fn refresh_vacation_mode(&self, settings: &RoutineSettings) -> bool {
        let last_motion = self
            .zone_last_motion(&settings.vacation_reference_zone)
            .ok()
            .flatten();
        // A zone that never saw motion is unknown, not evidence of absence.
        let on_vacation =
            last_motion.is_some_and(|at| now() - at > settings.vacation_after);

        tracing::info!(
            on_vacation,
            reference = %settings.vacation_reference_zone,
            "refreshed vacation mode"
        );
        if let Err(err) = self.set_flag(Flag::VacationMode, on_vacation).await {
            tracing::warn!(error = %err, "could not persist vacation mode");
        }
        on_vacation
    }
}
