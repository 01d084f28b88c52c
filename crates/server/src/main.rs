use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shared::{
    domain::Message,
    error::{ApiError, ErrorCode},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::{create_message, find_message, list_messages, ApiContext, CreateMessageRequest};
use app_state::AppState;
use config::load_settings;

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let state = AppState {
        api: ApiContext::default(),
    };
    let app = build_router(Arc::new(state), &settings.board_path);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, board_path = %settings.board_path, "board server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, board_path: &str) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(board_path, get(http_list_messages).post(http_create_message))
        .route(&format!("{board_path}/:id"), get(http_find_message))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_list_messages(State(state): State<Arc<AppState>>) -> Json<Vec<Message>> {
    Json(list_messages(&state.api).await)
}

async fn http_create_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<Message>), HttpError> {
    let message = create_message(&state.api, req).await.map_err(|e| {
        warn!(error = %e.message, "rejected message");
        to_http_error(e)
    })?;
    info!(nome = %message.nome, "message stored");
    Ok((StatusCode::CREATED, Json(message)))
}

async fn http_find_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Message>, HttpError> {
    find_message(&state.api, &id)
        .await
        .map(Json)
        .map_err(to_http_error)
}

fn to_http_error(error: ApiError) -> HttpError {
    let status = match error.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(error))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
