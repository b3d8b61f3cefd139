//! JSON REST handler for the zone status snapshot.

use axum::Json;
use axum::extract::State;

use lumo_app::ports::{FlagStore, LightDriver, MotionStore, WeatherProvider};
use lumo_domain::zone::ZoneSnapshot;

use crate::state::AppState;

/// `GET /api/zones` — lit/occupied status of every zone.
pub async fn list<L, F, M, W>(State(state): State<AppState<L, F, M, W>>) -> Json<Vec<ZoneSnapshot>>
where
    L: LightDriver + 'static,
    F: FlagStore + 'static,
    M: MotionStore + 'static,
    W: WeatherProvider + 'static,
{
    Json(state.engine.zone_snapshot().await)
}
