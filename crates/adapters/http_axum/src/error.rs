//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use lumo_domain::error::LumoError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`LumoError`] to an HTTP response with appropriate status code.
pub struct ApiError(LumoError);

impl From<LumoError> for ApiError {
    fn from(err: LumoError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            LumoError::UnknownZone { .. } | LumoError::UnknownSource { .. } => {
                (StatusCode::NOT_FOUND, self.0.to_string())
            }
            LumoError::Config(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            LumoError::Driver(err) => {
                tracing::error!(error = %err, "driver error");
                (StatusCode::BAD_GATEWAY, "light bridge unavailable".to_string())
            }
            LumoError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
