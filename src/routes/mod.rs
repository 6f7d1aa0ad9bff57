//! Router assembly.

mod common;
mod table;

pub use common::common_routes;
pub use table::table_routes;

use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// Every route of the service behind the configured body limit.
pub fn app(state: AppState) -> Router {
    let limit = state.settings.body_limit_bytes;
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(table_routes(state))
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(limit)))
}
