//! Startup: register the server's databases and snapshot each one.

use crate::catalog::{introspect, list_databases, Catalog, PgSchemaSource, SchemaSource};
use crate::config::Settings;
use crate::error::AppError;
use crate::pools::PoolRegistry;
use crate::sql::is_safe_identifier;

#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub databases: Vec<String>,
    pub persisted: Vec<String>,
    pub skipped: Vec<String>,
}

/// Introspect one database and install the result. Returns whether a snapshot was installed;
/// incomplete snapshots are installed only when `persist_partial` is set.
pub async fn refresh_database(
    catalog: &Catalog,
    source: &dyn SchemaSource,
    database: &str,
    persist_partial: bool,
) -> Result<bool, AppError> {
    let out = introspect(source, database).await?;
    if !out.is_complete() && !persist_partial {
        tracing::warn!(
            database = %database,
            issues = out.issues.len(),
            "snapshot incomplete; not persisted"
        );
        return Ok(false);
    }
    catalog.install(out.snapshot).await?;
    Ok(true)
}

/// List databases, make them the catalog's known set and, when enabled, snapshot every one.
/// A failure on one database is logged and does not stop the others.
pub async fn bootstrap(settings: &Settings, pools: &PoolRegistry, catalog: &Catalog) -> Result<BootstrapReport, AppError> {
    let databases = list_databases(pools.admin()).await?;
    tracing::info!(count = databases.len(), "databases listed");
    catalog.set_known_databases(databases.iter().cloned());
    if let Some(db) = &settings.default_database {
        if !databases.contains(db) {
            tracing::warn!(database = %db, "default database not found on server");
        }
    }

    let mut report = BootstrapReport {
        databases: databases.clone(),
        ..Default::default()
    };
    if !settings.introspect_on_startup {
        return Ok(report);
    }
    for db in databases {
        if !is_safe_identifier(&db) {
            tracing::warn!(database = %db, "database name not addressable; skipping");
            report.skipped.push(db);
            continue;
        }
        let source = PgSchemaSource::new(pools.pool_for(&db), settings.catalog_schema.clone());
        match refresh_database(catalog, &source, &db, settings.persist_partial_snapshots).await {
            Ok(true) => report.persisted.push(db),
            Ok(false) => report.skipped.push(db),
            Err(e) => {
                tracing::warn!(database = %db, error = %e, "introspection failed");
                report.skipped.push(db);
            }
        }
    }
    tracing::info!(
        persisted = report.persisted.len(),
        skipped = report.skipped.len(),
        "bootstrap complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDef, SnapshotStore};
    use async_trait::async_trait;

    struct OneTable {
        fail_keys: bool,
    }

    #[async_trait]
    impl SchemaSource for OneTable {
        async fn list_tables(&self) -> Result<Vec<String>, sqlx::Error> {
            Ok(vec!["product".into()])
        }

        async fn list_columns(&self, _table: &str) -> Result<Vec<ColumnDef>, sqlx::Error> {
            Ok(vec![ColumnDef::new("id", "integer"), ColumnDef::new("name", "text")])
        }

        async fn primary_key_columns(&self, _table: &str) -> Result<Vec<String>, sqlx::Error> {
            if self.fail_keys {
                return Err(sqlx::Error::Protocol("timeout".into()));
            }
            Ok(vec!["id".into()])
        }
    }

    #[tokio::test]
    async fn complete_snapshot_is_persisted_and_resolvable() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::new(SnapshotStore::new(dir.path()), "public");
        let installed = refresh_database(&catalog, &OneTable { fail_keys: false }, "shop", false)
            .await
            .unwrap();
        assert!(installed);
        assert!(dir.path().join("shop.json").exists());

        let t = catalog.resolve_table("shop", "product").await.unwrap().unwrap();
        assert_eq!(t.table.primary_key(), Some("id"));
    }

    #[tokio::test]
    async fn partial_snapshot_is_kept_out_unless_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::new(SnapshotStore::new(dir.path()), "public");
        let source = OneTable { fail_keys: true };

        assert!(!refresh_database(&catalog, &source, "shop", false).await.unwrap());
        assert!(!dir.path().join("shop.json").exists());

        assert!(refresh_database(&catalog, &source, "shop", true).await.unwrap());
        let t = catalog.resolve_table("shop", "product").await.unwrap().unwrap();
        assert_eq!(t.table.primary_key(), None);
    }
}
