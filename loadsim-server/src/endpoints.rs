//! Contains all HTTP endpoint handlers.

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use loadsim_service::{RequestDescriptor, Status};

use crate::state::ServiceState;

pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/", get(simulate))
        .route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    "OK"
}

/// The simulation entry point.
///
/// Customer and operation are carried in request metadata and default to
/// `"unknown"` when absent; the response body is plain text.
async fn simulate(State(state): State<ServiceState>, headers: HeaderMap) -> Response {
    let descriptor = RequestDescriptor::new(
        header_value(&headers, "X-Customer"),
        header_value(&headers, "X-Operation"),
    );

    let outcome = state.processor.process(descriptor).await;

    let status = match outcome.status {
        Status::Ok => StatusCode::OK,
        Status::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        Status::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, outcome.body).into_response()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}
