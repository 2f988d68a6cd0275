//! Handlers for the delta endpoints.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use deployset_core::{merge_deltas, Delta};

use crate::auth::identify;
use crate::envelope::{DeltaEnvelope, DeltaMetadata};
use crate::error::ApiError;
use crate::AppState;

/// `GET /orgs/{org}/apps/{app}/deltas`: all delta envelopes in the scope.
pub async fn list_deltas(
    State(state): State<AppState>,
    Path((org, app)): Path<(String, String)>,
) -> Result<Json<Vec<DeltaEnvelope>>, ApiError> {
    let deltas = state
        .repo
        .select_all_deltas(&org, &app)
        .await
        .map_err(|err| {
            log::error!("listing deltas in {org}/{app}: {err}");
            ApiError::Internal
        })?;
    Ok(Json(deltas))
}

/// `GET /orgs/{org}/apps/{app}/deltas/{id}`: one delta envelope.
pub async fn get_delta(
    State(state): State<AppState>,
    Path((org, app, delta_id)): Path<(String, String, String)>,
) -> Result<Json<DeltaEnvelope>, ApiError> {
    let envelope = state
        .repo
        .select_delta(&org, &app, &delta_id)
        .await
        .map_err(|err| ApiError::delta_lookup(err, &org, &app, &delta_id))?;
    Ok(Json(envelope))
}

/// `POST /orgs/{org}/apps/{app}/deltas`: stores a new delta and
/// returns its assigned id.
pub async fn create_delta(
    State(state): State<AppState>,
    Path((org, app)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<String>, ApiError> {
    let delta: Delta = serde_json::from_slice(&body).map_err(|_| ApiError::Unprocessable)?;

    let metadata = DeltaMetadata::new(&identify(&headers), Utc::now());
    let id = state
        .repo
        .insert_delta(&org, &app, false, metadata, delta)
        .await
        .map_err(|err| {
            log::error!("storing delta in {org}/{app}: {err}");
            ApiError::Internal
        })?;
    Ok(Json(id))
}

/// `PUT /orgs/{org}/apps/{app}/deltas/{id}`: replaces a delta's
/// content in full, refreshing its modification metadata.
pub async fn replace_delta(
    State(state): State<AppState>,
    Path((org, app, delta_id)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let delta: Delta = serde_json::from_slice(&body).map_err(|_| ApiError::Unprocessable)?;

    let current = state
        .repo
        .select_delta(&org, &app, &delta_id)
        .await
        .map_err(|err| ApiError::delta_lookup(err, &org, &app, &delta_id))?;

    let mut metadata = current.metadata;
    metadata.record_edit(&identify(&headers), Utc::now());

    state
        .repo
        .update_delta(&org, &app, &delta_id, false, metadata, delta)
        .await
        .map_err(|err| ApiError::delta_lookup(err, &org, &app, &delta_id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PATCH /orgs/{org}/apps/{app}/deltas/{id}`: folds the deltas in
/// the body into the stored one and returns the updated envelope.
///
/// An empty array returns the current envelope untouched.
pub async fn patch_delta(
    State(state): State<AppState>,
    Path((org, app, delta_id)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let deltas: Vec<Delta> = serde_json::from_slice(&body).map_err(|_| ApiError::Unprocessable)?;

    let current = state
        .repo
        .select_delta(&org, &app, &delta_id)
        .await
        .map_err(|err| ApiError::delta_lookup(err, &org, &app, &delta_id))?;

    if deltas.is_empty() {
        return Ok(Json(current).into_response());
    }

    let merged = merge_deltas(current.content, deltas).map_err(|err| {
        log::info!("merge rejected for {org}/{app}/{delta_id}: {err}");
        ApiError::MergeFailed(err.to_string())
    })?;

    let mut metadata = current.metadata;
    metadata.record_edit(&identify(&headers), Utc::now());

    state
        .repo
        .update_delta(&org, &app, &delta_id, false, metadata.clone(), merged.clone())
        .await
        .map_err(|err| ApiError::delta_lookup(err, &org, &app, &delta_id))?;

    Ok(Json(DeltaEnvelope {
        id: delta_id,
        metadata,
        content: merged,
    })
    .into_response())
}
