//! Circadian service — weather-gated schedule queries.
//!
//! Wraps the pure [`Schedule`] scan logic with the [`WeatherProvider`]
//! port: validity predicates need the current cloud cover, and a failed
//! read degrades to clear sky so the schedule keeps answering.

use std::sync::Arc;

use lumo_domain::circadian::{CircadianEvent, Schedule};
use lumo_domain::command::{self, LightCommand};
use lumo_domain::time::{Timestamp, now};

use crate::engine::Engine;
use crate::ports::{EventPublisher, FlagStore, LightDriver, MotionStore, WeatherProvider};

/// Positive padding added before re-checking after a long sleep; wall-clock
/// sleep accuracy is not guaranteed.
const WAKE_PADDING: std::time::Duration = std::time::Duration::from_secs(30);

/// Answers "which lighting event is active now" and "when is the next one".
pub struct CircadianService<W> {
    schedule: Schedule,
    weather: W,
}

impl<W: WeatherProvider> CircadianService<W> {
    pub fn new(schedule: Schedule, weather: W) -> Self {
        Self { schedule, weather }
    }

    #[must_use]
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// The event active at `at`, honoring weather-gated validity.
    pub async fn current_event(&self, at: Timestamp) -> CircadianEvent {
        let cloud_cover = self.cloud_cover().await;
        self.schedule.current_event(at, cloud_cover).clone()
    }

    /// The next valid event after `at` and the instant it triggers.
    pub async fn next_event(&self, at: Timestamp) -> (Timestamp, CircadianEvent) {
        let cloud_cover = self.cloud_cover().await;
        let (trigger, event) = self.schedule.next_event(at, cloud_cover);
        (trigger, event.clone())
    }

    /// Merge the event's color and brightness into an explicit request.
    #[must_use]
    pub fn apply_to_command(event: &CircadianEvent, base: LightCommand) -> LightCommand {
        command::compose(base, event)
    }

    async fn cloud_cover(&self) -> f64 {
        match self.weather.cloud_cover().await {
            Ok(cover) => cover.clamp(0.0, 1.0),
            Err(err) => {
                tracing::warn!(error = %err, "cloud cover unavailable, assuming clear sky");
                0.0
            }
        }
    }
}

/// Run the circadian event loop forever: sleep until the next event, then
/// re-derive the active event and re-color every lit zone. Spawn this on
/// the runtime.
pub async fn run<L, F, M, W, P>(engine: Arc<Engine<L, F, M, W, P>>)
where
    L: LightDriver,
    F: FlagStore,
    M: MotionStore,
    W: WeatherProvider,
    P: EventPublisher + Send + Sync,
{
    loop {
        let at = now();
        let (trigger, event) = engine.circadian().next_event(at).await;
        let wait = (trigger - at).to_std().unwrap_or_default() + WAKE_PADDING;
        tracing::info!(
            event = %event.name,
            trigger = %trigger,
            wait_secs = wait.as_secs(),
            "sleeping until next circadian event"
        );
        tokio::time::sleep(wait).await;

        // The sleep may have been cut short or stretched; trust the clock,
        // not the plan.
        let current = engine.circadian().current_event(now()).await;
        engine.apply_circadian_event(&current).await;
    }
}
