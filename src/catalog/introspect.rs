//! Schema introspection: read a database's information_schema into a Snapshot.

use crate::catalog::{ColumnDef, Snapshot, TableDef};
use crate::error::{IntrospectError, IntrospectStep};
use async_trait::async_trait;
use sqlx::PgPool;

/// Catalog queries the introspector needs, one database at a time.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Base-table names.
    async fn list_tables(&self) -> Result<Vec<String>, sqlx::Error>;
    /// Columns of one table in ordinal order.
    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnDef>, sqlx::Error>;
    /// Primary-key columns of one table in key order; empty when there is no key.
    async fn primary_key_columns(&self, table: &str) -> Result<Vec<String>, sqlx::Error>;
}

/// information_schema reader over a pool connected to the database being introspected.
pub struct PgSchemaSource {
    pool: PgPool,
    schema: String,
}

impl PgSchemaSource {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgSchemaSource {
            pool,
            schema: schema.into(),
        }
    }
}

#[async_trait]
impl SchemaSource for PgSchemaSource {
    async fn list_tables(&self) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_type = 'BASE TABLE' AND table_schema = $1
            ORDER BY table_name
            "#,
        )
        .bind(&self.schema)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(n,)| n).collect())
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnDef>, sqlx::Error> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT column_name::text, data_type::text, udt_schema::text, udt_name::text
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
            "#,
        )
        .bind(&self.schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(name, ty, udt_schema, udt_name)| ColumnDef::new(name, ty).with_udt(udt_schema, udt_name))
            .collect())
    }

    async fn primary_key_columns(&self, table: &str) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT kcu.column_name::text
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
             AND tc.table_schema = kcu.table_schema
             AND tc.table_name = kcu.table_name
            WHERE tc.constraint_type = 'PRIMARY KEY'
              AND tc.table_schema = $1
              AND tc.table_name = $2
            ORDER BY kcu.ordinal_position
            "#,
        )
        .bind(&self.schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(n,)| n).collect())
    }
}

/// Result of one introspection pass: the snapshot plus every sub-query that failed.
/// A table whose column or key query failed is still present, just incomplete.
#[derive(Debug)]
pub struct Introspection {
    pub snapshot: Snapshot,
    pub issues: Vec<IntrospectError>,
}

impl Introspection {
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Build a snapshot of `database`. Only a failure to list tables is fatal.
///
/// Composite primary keys are not supported: the last key column is kept.
pub async fn introspect(source: &dyn SchemaSource, database: &str) -> Result<Introspection, IntrospectError> {
    fn issue(database: &str, step: IntrospectStep, table: Option<&str>, e: sqlx::Error) -> IntrospectError {
        IntrospectError {
            database: database.to_string(),
            step,
            table: table.map(str::to_string),
            message: e.to_string(),
        }
    }

    let names = source
        .list_tables()
        .await
        .map_err(|e| issue(database, IntrospectStep::Tables, None, e))?;

    let mut tables = Vec::with_capacity(names.len());
    let mut issues = Vec::new();
    for name in names {
        let columns = match source.list_columns(&name).await {
            Ok(cols) => cols,
            Err(e) => {
                let err = issue(database, IntrospectStep::Columns, Some(name.as_str()), e);
                tracing::warn!(error = %err, "introspection incomplete");
                issues.push(err);
                Vec::new()
            }
        };
        let primary_key = match source.primary_key_columns(&name).await {
            Ok(mut keys) => {
                if keys.len() > 1 {
                    tracing::warn!(
                        database = %database,
                        table = %name,
                        key_columns = ?keys,
                        "composite primary key not supported; keeping last column"
                    );
                }
                keys.pop()
            }
            Err(e) => {
                let err = issue(database, IntrospectStep::PrimaryKey, Some(name.as_str()), e);
                tracing::warn!(error = %err, "introspection incomplete");
                issues.push(err);
                None
            }
        };
        tables.push(TableDef::new(name, columns, primary_key));
    }

    let snapshot = Snapshot::new(database, tables);
    tracing::info!(
        database = %database,
        tables = snapshot.table_count,
        issues = issues.len(),
        "introspected"
    );
    Ok(Introspection { snapshot, issues })
}

/// Databases on the server that accept connections, by name.
pub async fn list_databases(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT datname::text FROM pg_database WHERE NOT datistemplate AND datallowconn ORDER BY datname",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(n,)| n).collect())
}
