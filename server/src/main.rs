//! Tablekit server: lists the server's databases, snapshots their schemas and
//! serves generic CRUD on every table.
//!
//! Run from repo root: `cargo run -p tablekit-server`

use std::sync::Arc;
use tablekit::{app, bootstrap, init_tracing, AppState, Catalog, PoolRegistry, Settings, SnapshotStore};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("tablekit=info,tablekit_server=info");

    let settings = Settings::from_env()?;
    let pools = Arc::new(PoolRegistry::new(&settings.database_url, settings.max_connections)?);
    let catalog = Arc::new(Catalog::new(
        SnapshotStore::new(settings.metadata_dir.clone()),
        settings.catalog_schema.clone(),
    ));

    match bootstrap(&settings, &pools, &catalog).await {
        Ok(report) => tracing::info!(
            databases = report.databases.len(),
            persisted = report.persisted.len(),
            "catalog ready"
        ),
        // Persisted snapshots from an earlier run still serve requests.
        Err(e) => tracing::warn!(error = %e, "bootstrap failed; serving persisted snapshots only"),
    }

    let listen_addr = settings.listen_addr;
    let state = AppState {
        catalog,
        pools: pools.clone(),
        settings: Arc::new(settings),
    };

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    pools.close_all().await;
    Ok(())
}
