//! Table CRUD routes. Handlers resolve database and table through the catalog on every request.

use crate::handlers::{
    create, create_default, delete as delete_handler, delete_default, list, list_databases, list_default, update,
    update_default,
};
use crate::state::AppState;
use axum::{routing::get, Router};

/// GET /databases and POST|GET|PUT|DELETE /:db/:table. With a default database configured,
/// the same four methods on /:table address that database. Static paths take priority, so
/// tables named `databases`, `health`, `ready` or `version` are only reachable as /:db/:table.
pub fn table_routes(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/databases", get(list_databases))
        .route(
            "/:db/:table",
            get(list).post(create).put(update).delete(delete_handler),
        );
    if state.settings.default_database.is_some() {
        router = router.route(
            "/:table",
            get(list_default)
                .post(create_default)
                .put(update_default)
                .delete(delete_default),
        );
    }
    router.with_state(state)
}
