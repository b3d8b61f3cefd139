//! JSON REST handlers triggering the arrival and wake-up routines.
//!
//! Both routines hold or fade lights over many minutes, so the handlers
//! spawn them and answer `202 Accepted` immediately; outcomes land in the
//! logs and on the event stream.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;

use lumo_app::ports::{FlagStore, LightDriver, MotionStore, WeatherProvider};

use crate::state::AppState;

/// `POST /api/routines/arrival`
pub async fn arrival<L, F, M, W>(State(state): State<AppState<L, F, M, W>>) -> StatusCode
where
    L: LightDriver + 'static,
    F: FlagStore + 'static,
    M: MotionStore + 'static,
    W: WeatherProvider + 'static,
{
    let engine = Arc::clone(&state.engine);
    let settings = Arc::clone(&state.routines);
    tokio::spawn(async move {
        match engine.perform_arrival(&settings).await {
            Ok(outcome) => tracing::info!(?outcome, "arrival routine finished"),
            Err(err) => tracing::warn!(error = %err, "arrival routine failed"),
        }
    });
    StatusCode::ACCEPTED
}

/// `POST /api/routines/wakeup`
pub async fn wakeup<L, F, M, W>(State(state): State<AppState<L, F, M, W>>) -> StatusCode
where
    L: LightDriver + 'static,
    F: FlagStore + 'static,
    M: MotionStore + 'static,
    W: WeatherProvider + 'static,
{
    let engine = Arc::clone(&state.engine);
    let settings = Arc::clone(&state.routines);
    tokio::spawn(async move {
        match engine.perform_wakeup(&settings).await {
            Ok(outcome) => tracing::info!(?outcome, "wakeup routine finished"),
            Err(err) => tracing::warn!(error = %err, "wakeup routine failed"),
        }
    });
    StatusCode::ACCEPTED
}
