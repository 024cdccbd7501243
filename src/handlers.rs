use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::config::Config;
use crate::dispatcher::CallScript;
use crate::error::AppError;
use crate::types::{CallResponse, HealthResponse};

pub struct AppState {
    pub config: Config,
    pub script: CallScript,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let script = CallScript::from_config(&config);
        Self { config, script }
    }
}

pub async fn make_call(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let number = state
        .config
        .call_to
        .as_deref()
        .ok_or(AppError::MissingPhoneNumber)?;

    let invocation = state.script.place_call(number).await?;

    Ok(Json(CallResponse::from_invocation(
        invocation,
        state.config.report_exit_code,
    )))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = if state.config.call_to.is_some() {
        "ok"
    } else {
        "no_destination"
    };
    Json(HealthResponse {
        status: status.to_string(),
    })
}
