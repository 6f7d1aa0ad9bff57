//! Per-database connection pools. A PostgreSQL connection is bound to one database,
//! so each database a request names gets its own lazily created pool.

use crate::error::ConfigError;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

pub struct PoolRegistry {
    base: PgConnectOptions,
    max_connections: u32,
    admin: PgPool,
    pools: RwLock<HashMap<String, PgPool>>,
}

impl PoolRegistry {
    /// `database_url` names the admin database; other databases reuse its host and credentials.
    pub fn new(database_url: &str, max_connections: u32) -> Result<Self, ConfigError> {
        let base = PgConnectOptions::from_str(database_url).map_err(|e| ConfigError::Invalid {
            name: "DATABASE_URL",
            reason: e.to_string(),
        })?;
        let admin = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy_with(base.clone());
        Ok(PoolRegistry {
            base,
            max_connections,
            admin,
            pools: RwLock::new(HashMap::new()),
        })
    }

    /// Pool on the database named in `DATABASE_URL`.
    pub fn admin(&self) -> &PgPool {
        &self.admin
    }

    pub fn options_for(&self, database: &str) -> PgConnectOptions {
        self.base.clone().database(database)
    }

    /// Pool for `database`. Callers pass only names the catalog accepted.
    pub fn pool_for(&self, database: &str) -> PgPool {
        if let Some(pool) = self.pools.read().unwrap_or_else(PoisonError::into_inner).get(database) {
            return pool.clone();
        }
        let mut pools = self.pools.write().unwrap_or_else(PoisonError::into_inner);
        pools
            .entry(database.to_string())
            .or_insert_with(|| {
                tracing::debug!(database = %database, "creating pool");
                PgPoolOptions::new()
                    .max_connections(self.max_connections)
                    .connect_lazy_with(self.options_for(database))
            })
            .clone()
    }

    pub async fn close_all(&self) {
        let pools: Vec<PgPool> = self
            .pools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for pool in pools {
            pool.close().await;
        }
        self.admin.close().await;
    }
}
