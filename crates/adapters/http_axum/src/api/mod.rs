//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod circadian;
#[allow(clippy::missing_errors_doc)]
pub mod flags;
#[allow(clippy::missing_errors_doc)]
pub mod routines;
pub mod sse;
#[allow(clippy::missing_errors_doc)]
pub mod zones;

use axum::Router;
use axum::routing::{get, post};

use lumo_app::ports::{FlagStore, LightDriver, MotionStore, WeatherProvider};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<L, F, M, W>() -> Router<AppState<L, F, M, W>>
where
    L: LightDriver + 'static,
    F: FlagStore + 'static,
    M: MotionStore + 'static,
    W: WeatherProvider + 'static,
{
    Router::new()
        // Zones
        .route("/zones", get(zones::list::<L, F, M, W>))
        // Circadian schedule
        .route("/circadian/current", get(circadian::current::<L, F, M, W>))
        .route("/circadian/next", get(circadian::next::<L, F, M, W>))
        // Flags
        .route(
            "/flags/{name}",
            get(flags::get::<L, F, M, W>).put(flags::put::<L, F, M, W>),
        )
        // Routines
        .route("/routines/arrival", post(routines::arrival::<L, F, M, W>))
        .route("/routines/wakeup", post(routines::wakeup::<L, F, M, W>))
        // Live zone events
        .route("/events/stream", get(sse::stream::<L, F, M, W>))
}
