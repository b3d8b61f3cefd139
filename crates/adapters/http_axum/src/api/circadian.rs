//! JSON REST handlers for circadian schedule queries.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use lumo_app::ports::{FlagStore, LightDriver, MotionStore, WeatherProvider};
use lumo_domain::circadian::CircadianEvent;
use lumo_domain::time::{Timestamp, now};

use crate::state::AppState;

/// Response for the next-event query.
#[derive(Serialize)]
pub struct NextEventResponse {
    pub at: Timestamp,
    pub event: CircadianEvent,
}

/// `GET /api/circadian/current` — the event active right now.
pub async fn current<L, F, M, W>(
    State(state): State<AppState<L, F, M, W>>,
) -> Json<CircadianEvent>
where
    L: LightDriver + 'static,
    F: FlagStore + 'static,
    M: MotionStore + 'static,
    W: WeatherProvider + 'static,
{
    Json(state.engine.circadian().current_event(now()).await)
}

/// `GET /api/circadian/next` — the next event and when it triggers.
pub async fn next<L, F, M, W>(
    State(state): State<AppState<L, F, M, W>>,
) -> Json<NextEventResponse>
where
    L: LightDriver + 'static,
    F: FlagStore + 'static,
    M: MotionStore + 'static,
    W: WeatherProvider + 'static,
{
    let (at, event) = state.engine.circadian().next_event(now()).await;
    Json(NextEventResponse { at, event })
}
