use std::fmt;
use std::net::SocketAddr;

use axum::extract::{Path, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::Method;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use contracts::{
    Allocation, ApiError, ConditionConfig, ErrorCode, EvaluationResult, SessionSnapshot,
    StageProgress, TrustOutcome, SCHEMA_VERSION_V1,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use study_core::EngineError;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::{RegistryError, SessionRegistry};

const ALLOCATION_KEY_PREFIX: &str = "allocation_";

include!("error.rs");
include!("state.rs");
include!("routes/sessions.rs");
include!("routes/play.rs");
include!("util.rs");

pub async fn serve(addr: SocketAddr) -> Result<(), ServerError> {
    let state = AppState::new();
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/conditions", get(list_conditions))
        .route("/api/v1/sessions", post(create_session))
        .route("/api/v1/sessions/{session_id}", get(get_session))
        .route("/api/v1/sessions/{session_id}/stage", get(get_stage))
        .route("/api/v1/sessions/{session_id}/progress", get(get_progress))
        .route("/api/v1/sessions/{session_id}/trust/play", post(play_trust))
        .route(
            "/api/v1/sessions/{session_id}/allocation/play",
            post(play_allocation),
        )
        .route("/api/v1/portfolio/evaluate", post(evaluate_portfolio))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests;
