//! HTTP service storing deployment sets and deltas.
//!
//! Sets are immutable and content-addressed: applying a delta to a
//! stored set persists the result under its canonical hash and
//! returns that id. Deltas are mutable edit intents that can be
//! replaced wholesale or grown by folding further deltas in.

pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod repository;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::repository::Repository;

/// Shared per-request context: just the repository handle.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
}

/// Builds the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/orgs/:org_id/apps/:app_id/sets", get(handlers::sets::list_sets))
        .route(
            "/orgs/:org_id/apps/:app_id/sets/:set_id",
            get(handlers::sets::get_set).post(handlers::sets::apply_delta),
        )
        .route("/sets/:set_id", get(handlers::sets::get_unscoped_set))
        .route(
            "/orgs/:org_id/apps/:app_id/deltas",
            get(handlers::deltas::list_deltas).post(handlers::deltas::create_delta),
        )
        .route(
            "/orgs/:org_id/apps/:app_id/deltas/:delta_id",
            get(handlers::deltas::get_delta)
                .put(handlers::deltas::replace_delta)
                .patch(handlers::deltas::patch_delta),
        )
        .route("/alive", get(handlers::probes::alive))
        .route("/ready", get(handlers::probes::ready))
        .with_state(state)
}
