mod config;
mod dispatcher;
mod error;
mod handlers;
mod types;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use log::{info, warn};
use tower_http::cors::CorsLayer;

use config::Config;
use handlers::AppState;

async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, StatusCode> {
    let Some(api_key) = state.config.api_key.as_deref() else {
        return Ok(next.run(req).await);
    };

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth_header.strip_prefix("Bearer ").unwrap_or(auth_header);

    if token == api_key {
        Ok(next.run(req).await)
    } else {
        warn!("Rejected {} {}: bad API key", req.method(), req.uri().path());
        Err(StatusCode::UNAUTHORIZED)
    }
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::make_call))
        .route("/health", get(handlers::health))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();

    let config = Config::from_env()?;

    match &config.call_to {
        Some(number) => info!("Destination number: {}", number),
        None => warn!("CALL_TO is not set; calls will be rejected"),
    }
    info!(
        "Call program: {} {}",
        config.program,
        config.script.as_deref().unwrap_or("")
    );
    if config.api_key.is_some() {
        info!("API key authentication enabled");
    }

    let addr = config.bind_address;
    let state = Arc::new(AppState::new(config));

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
