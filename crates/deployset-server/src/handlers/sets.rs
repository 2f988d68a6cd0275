//! Handlers for the set endpoints.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use deployset_core::{apply, diff, hash, Delta, Set, EMPTY_SET_ID};

use crate::envelope::{SetEnvelope, SetMetadata};
use crate::error::ApiError;
use crate::handlers::is_zero_hash;
use crate::repository::{Repository, RepositoryError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SetQuery {
    diff: Option<String>,
}

/// `GET /orgs/{org}/apps/{app}/sets`: all set envelopes in the scope.
pub async fn list_sets(
    State(state): State<AppState>,
    Path((org, app)): Path<(String, String)>,
) -> Result<Json<Vec<SetEnvelope>>, ApiError> {
    let sets = state
        .repo
        .select_all_sets(&org, &app)
        .await
        .map_err(|err| {
            log::error!("listing sets in {org}/{app}: {err}");
            ApiError::Internal
        })?;
    Ok(Json(sets))
}

/// `GET /orgs/{org}/apps/{app}/sets/{id}`: the set's content, or,
/// with `?diff={right}`, the delta that rebuilds this set from the
/// right one.
pub async fn get_set(
    State(state): State<AppState>,
    Path((org, app, set_id)): Path<(String, String, String)>,
    Query(query): Query<SetQuery>,
) -> Result<Response, ApiError> {
    if let Some(right_id) = query.diff {
        let left = load_raw_set(state.repo.as_ref(), &org, &app, &set_id).await?;
        let right = load_raw_set(state.repo.as_ref(), &org, &app, &right_id).await?;
        return Ok(Json(diff(&left, &right)).into_response());
    }

    if is_zero_hash(&set_id) {
        return Ok(Json(Set::default()).into_response());
    }
    let envelope = state
        .repo
        .select_set(&org, &app, &set_id)
        .await
        .map_err(|err| ApiError::set_lookup(err, &org, &app, &set_id))?;
    Ok(Json(envelope.content).into_response())
}

/// `GET /sets/{id}`: a set's content looked up by id alone.
pub async fn get_unscoped_set(
    State(state): State<AppState>,
    Path(set_id): Path<String>,
) -> Result<Json<Set>, ApiError> {
    if is_zero_hash(&set_id) {
        return Ok(Json(Set::default()));
    }
    let set = state
        .repo
        .select_unscoped_set(&set_id)
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound => {
                ApiError::NotFound(format!(r#"Set with ID "{set_id}" does not exist."#))
            }
            other => {
                log::error!("unscoped set lookup for {set_id}: {other}");
                ApiError::Internal
            }
        })?;
    Ok(Json(set))
}

/// `POST /orgs/{org}/apps/{app}/sets/{id}`: applies the delta in the
/// body to the named set and stores the result under its content id.
///
/// An empty delta echoes the base id without writing. A delta that
/// fails to apply is a 400; a malformed body is a 422.
pub async fn apply_delta(
    State(state): State<AppState>,
    Path((org, app, set_id)): Path<(String, String, String)>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let delta: Delta = serde_json::from_slice(&body).map_err(|_| ApiError::Unprocessable)?;

    let base = load_raw_set(state.repo.as_ref(), &org, &app, &set_id).await?;

    if delta.is_empty() {
        let id = if is_zero_hash(&set_id) {
            EMPTY_SET_ID.to_string()
        } else {
            set_id
        };
        return Ok((StatusCode::OK, Json(id)).into_response());
    }

    let next = apply(&base, &delta).map_err(|err| {
        log::info!("delta rejected for {org}/{app}/{set_id}: {err}");
        ApiError::IncompatibleDelta
    })?;
    let id = hash(&next);

    let envelope = SetEnvelope {
        id: id.clone(),
        metadata: SetMetadata {
            created_at: Utc::now(),
        },
        content: next,
    };
    match state.repo.insert_set(&org, &app, envelope).await {
        // Concurrent writers computing the same content race benignly;
        // both report the same id.
        Ok(()) | Err(RepositoryError::AlreadyExists) => {}
        Err(err) => {
            log::error!("storing set {id} in {org}/{app}: {err}");
            return Err(ApiError::Internal);
        }
    }

    Ok((StatusCode::OK, Json(id)).into_response())
}

async fn load_raw_set(
    repo: &dyn Repository,
    org: &str,
    app: &str,
    id: &str,
) -> Result<Set, ApiError> {
    if is_zero_hash(id) {
        return Ok(Set::default());
    }
    repo.select_raw_set(org, app, id)
        .await
        .map_err(|err| ApiError::set_lookup(err, org, app, id))
}
