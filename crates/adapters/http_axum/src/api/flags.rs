//! JSON REST handlers for operating-mode flags.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use lumo_app::ports::{Flag, FlagStore, LightDriver, MotionStore, WeatherProvider};

use crate::error::ApiError;
use crate::state::AppState;

/// Current value of one flag.
#[derive(Serialize)]
pub struct FlagView {
    pub name: String,
    pub value: bool,
}

/// Request body for updating a flag.
#[derive(Deserialize)]
pub struct UpdateFlagRequest {
    pub value: bool,
}

/// Possible responses from the flag endpoints.
pub enum FlagResponse {
    Ok(Json<FlagView>),
    UnknownFlag(String),
}

impl IntoResponse for FlagResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
            Self::UnknownFlag(name) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": format!("unknown flag '{name}'")})),
            )
                .into_response(),
        }
    }
}

/// `GET /api/flags/{name}`
pub async fn get<L, F, M, W>(
    State(state): State<AppState<L, F, M, W>>,
    Path(name): Path<String>,
) -> FlagResponse
where
    L: LightDriver + 'static,
    F: FlagStore + 'static,
    M: MotionStore + 'static,
    W: WeatherProvider + 'static,
{
    let Ok(flag) = Flag::from_str(&name) else {
        return FlagResponse::UnknownFlag(name);
    };
    let value = state.engine.flag(flag).await;
    FlagResponse::Ok(Json(FlagView { name, value }))
}

/// `PUT /api/flags/{name}`
pub async fn put<L, F, M, W>(
    State(state): State<AppState<L, F, M, W>>,
    Path(name): Path<String>,
    Json(body): Json<UpdateFlagRequest>,
) -> Result<FlagResponse, ApiError>
where
    L: LightDriver + 'static,
    F: FlagStore + 'static,
    M: MotionStore + 'static,
    W: WeatherProvider + 'static,
{
    let Ok(flag) = Flag::from_str(&name) else {
        return Ok(FlagResponse::UnknownFlag(name));
    };
    state.engine.set_flag(flag, body.value).await?;
    Ok(FlagResponse::Ok(Json(FlagView {
        name,
        value: body.value,
    })))
}
