//! Shared application state for axum handlers.

use std::sync::Arc;

use lumo_app::engine::Engine;
use lumo_app::event_bus::InProcessEventBus;
use lumo_app::ports::{FlagStore, LightDriver, MotionStore, WeatherProvider};
use lumo_app::routines::RoutineSettings;

/// The engine as the HTTP layer sees it: events always flow through the
/// in-process bus so the SSE endpoint can subscribe to it.
pub type EngineFor<L, F, M, W> = Engine<L, F, M, W, Arc<InProcessEventBus>>;

/// Application state shared across all axum handlers.
///
/// Generic over the engine's port types to avoid dynamic dispatch. `Clone`
/// is implemented manually so the underlying types themselves do not need
/// to be `Clone` — only the `Arc` wrappers are cloned.
pub struct AppState<L, F, M, W> {
    /// The occupancy engine.
    pub engine: Arc<EngineFor<L, F, M, W>>,
    /// Event bus the SSE stream subscribes to.
    pub event_bus: Arc<InProcessEventBus>,
    /// Arrival/wake-up routine configuration.
    pub routines: Arc<RoutineSettings>,
}

impl<L, F, M, W> Clone for AppState<L, F, M, W> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            event_bus: Arc::clone(&self.event_bus),
            routines: Arc::clone(&self.routines),
        }
    }
}

impl<L, F, M, W> AppState<L, F, M, W>
where
    L: LightDriver + 'static,
    F: FlagStore + 'static,
    M: MotionStore + 'static,
    W: WeatherProvider + 'static,
{
    /// Create a new application state.
    pub fn new(
        engine: Arc<EngineFor<L, F, M, W>>,
        event_bus: Arc<InProcessEventBus>,
        routines: RoutineSettings,
    ) -> Self {
        Self {
            engine,
            event_bus,
            routines: Arc::new(routines),
        }
    }
}
