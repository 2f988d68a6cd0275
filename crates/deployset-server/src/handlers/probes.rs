//! Liveness and readiness probes.

use axum::http::StatusCode;

pub async fn alive() -> StatusCode {
    StatusCode::OK
}

pub async fn ready() -> StatusCode {
    StatusCode::OK
}
