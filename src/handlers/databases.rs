//! Database listing.

use crate::response::success_many;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};

/// Databases requests may address, as registered at bootstrap.
pub async fn list_databases(State(state): State<AppState>) -> impl IntoResponse {
    success_many(state.catalog.known_databases())
}
