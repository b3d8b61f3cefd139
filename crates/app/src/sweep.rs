//! Periodic idle sweep runner.
//!
//! Wakes on a fixed cadence — half the smallest configured motion timeout —
//! and asks the engine to power off every zone that has been motion-free
//! long enough. The engine recomputes "now" and the timeouts on every tick,
//! so missed wakeups or processing delay self-correct without drift.

use std::sync::Arc;

use crate::engine::Engine;
use crate::ports::{EventPublisher, FlagStore, LightDriver, MotionStore, WeatherProvider};

/// Run the sweep loop forever. Spawn this on the runtime.
pub async fn run<L, F, M, W, P>(engine: Arc<Engine<L, F, M, W, P>>)
where
    L: LightDriver,
    F: FlagStore,
    M: MotionStore,
    W: WeatherProvider,
    P: EventPublisher + Send + Sync,
{
    let cadence = engine.sweep_cadence();
    tracing::info!(cadence_secs = cadence.as_secs(), "idle sweep started");

    let mut ticker = tokio::time::interval(cadence);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        engine.disable_inactive_zones().await;
    }
}
