//! HTTP API.
//!
//! - `POST /query` `{ "question": "..." }` returns `{ "answer", "sources" }`
//! - `GET /health` always returns `{ "status": "healthy" }`
//!
//! Errors come back as `{ "error", "code" }`; a service that is not ready yet
//! answers `503` with code `NOT_INITIALIZED`, and a body that is not a valid
//! query keeps axum's 4xx status with code `INVALID_REQUEST`.

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, http::StatusCode, response::Json, routing::{get, post}, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use mdrag_core::error::Error;
use mdrag_core::types::QueryResult;
use mdrag_qa::QueryService;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn router(service: Arc<QueryService>, enable_cors: bool) -> Router {
    let app = Router::new()
        .route("/query", post(query))
        .route("/health", get(health_check))
        .with_state(service);

    if enable_cors {
        app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
            .layer(TraceLayer::new_for_http())
    } else {
        app.layer(TraceLayer::new_for_http())
    }
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    tracing::info!("HTTP API listening on {}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

async fn query(
    State(service): State<Arc<QueryService>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResult>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected query body");
        error_response(rejection.status(), rejection.body_text(), "INVALID_REQUEST")
    })?;
    if req.question.trim().is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "question must not be empty".to_string(), "INVALID_QUESTION"));
    }
    match service.answer(&req.question).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            tracing::warn!(error = %e, "query failed");
            Err(map_error(&e))
        }
    }
}

fn map_error(err: &Error) -> ApiError {
    let (status, code) = match err {
        Error::NotReady(_) => (StatusCode::SERVICE_UNAVAILABLE, "NOT_INITIALIZED"),
        Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
        Error::Ingestion { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INGESTION_ERROR"),
        Error::Embedding(_) => (StatusCode::INTERNAL_SERVER_ERROR, "EMBEDDING_ERROR"),
        Error::Synthesis(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SYNTHESIS_ERROR"),
    };
    error_response(status, err.to_string(), code)
}

fn error_response(status: StatusCode, error: String, code: &str) -> ApiError {
    (status, Json(ErrorResponse { error, code: code.to_string() }))
}
