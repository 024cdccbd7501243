use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};

use crate::types::ErrorResponse;

pub const MISSING_PHONE_NUMBER: &str = "Phone number is required.";

pub enum AppError {
    /// `CALL_TO` is unset or empty.
    MissingPhoneNumber,
    /// The call program could not be started or read from.
    Invocation(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::MissingPhoneNumber => {
                warn!("Rejecting call: CALL_TO is not configured");
                (StatusCode::BAD_REQUEST, MISSING_PHONE_NUMBER.to_string())
            }
            AppError::Invocation(err) => {
                error!("Call invocation failed: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", err))
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Invocation(err.into())
    }
}
