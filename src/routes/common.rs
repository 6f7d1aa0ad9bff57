//! Liveness, readiness and build info.

use crate::catalog::Catalog;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize, Debug, PartialEq, Eq)]
struct Readiness {
    status: &'static str,
    /// Whether the admin database answered.
    admin_database: bool,
    known_databases: usize,
    /// Database whose snapshot sits in the catalog slot, if any has been loaded.
    cached_snapshot: Option<String>,
    cached_tables: usize,
}

fn readiness(catalog: &Catalog, admin_reachable: bool) -> (StatusCode, Readiness) {
    let current = catalog.current();
    let body = Readiness {
        status: if admin_reachable { "ok" } else { "degraded" },
        admin_database: admin_reachable,
        known_databases: catalog.known_databases().len(),
        cached_snapshot: current.as_ref().map(|s| s.database.clone()),
        cached_tables: current.as_ref().map_or(0, |s| s.table_count),
    };
    let status = if admin_reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, body)
}

async fn health() -> &'static str {
    "ok"
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let reachable = match sqlx::query("SELECT 1").execute(state.pools.admin()).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "admin database ping failed");
            false
        }
    };
    let (status, body) = readiness(&state.catalog, reachable);
    (status, Json(body))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /health, GET /ready (admin ping plus catalog state), GET /version.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDef, Snapshot, SnapshotStore, TableDef};

    #[tokio::test]
    async fn readiness_reports_catalog_state() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::new(SnapshotStore::new(dir.path()), "public");

        let (status, body) = readiness(&catalog, true);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.known_databases, 0);
        assert_eq!(body.cached_snapshot, None);

        catalog.set_known_databases(["shop".to_string(), "hr".to_string()]);
        catalog
            .install(Snapshot::new(
                "shop",
                vec![TableDef::new("product", vec![ColumnDef::new("id", "integer")], Some("id".into()))],
            ))
            .await
            .unwrap();
        let (status, body) = readiness(&catalog, true);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            Readiness {
                status: "ok",
                admin_database: true,
                known_databases: 2,
                cached_snapshot: Some("shop".into()),
                cached_tables: 1,
            }
        );
    }

    #[test]
    fn unreachable_admin_database_is_unavailable() {
        let catalog = Catalog::new(SnapshotStore::new("/nonexistent"), "public");
        let (status, body) = readiness(&catalog, false);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "degraded");
        assert!(!body.admin_database);
    }
}
