//! Process-wide schema catalog: one cached snapshot at a time, reloaded from the store on a miss.
//!
//! The slot holds an immutable `Arc<Snapshot>`. Readers clone the `Arc` under a
//! short read lock and answer from that value only; a reload builds the new
//! snapshot with no lock held and swaps it in under a short write lock.

use crate::catalog::{Snapshot, SnapshotStore, TableDef};
use crate::error::AppError;
use crate::sql::is_safe_identifier;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

/// A table descriptor together with where it lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTable {
    pub database: String,
    pub schema: String,
    pub table: TableDef,
}

pub struct Catalog {
    schema: String,
    store: SnapshotStore,
    slot: RwLock<Option<Arc<Snapshot>>>,
    /// Databases requests may name. `None` until the server list is known; then anything else is not found.
    known: RwLock<Option<HashSet<String>>>,
}

impl Catalog {
    pub fn new(store: SnapshotStore, schema: impl Into<String>) -> Self {
        Catalog {
            schema: schema.into(),
            store,
            slot: RwLock::new(None),
            known: RwLock::new(None),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn set_known_databases<I>(&self, names: I)
    where
        I: IntoIterator<Item = String>,
    {
        let names: HashSet<String> = names.into_iter().collect();
        *self.known.write().unwrap_or_else(PoisonError::into_inner) = Some(names);
    }

    /// Known database names, sorted. Empty when no list was registered.
    pub fn known_databases(&self) -> Vec<String> {
        let known = self.known.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = known.iter().flatten().cloned().collect();
        names.sort();
        names
    }

    pub fn is_known_database(&self, database: &str) -> bool {
        if !is_safe_identifier(database) {
            return false;
        }
        let known = self.known.read().unwrap_or_else(PoisonError::into_inner);
        known.as_ref().map_or(true, |k| k.contains(database))
    }

    /// The snapshot currently in the slot.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn publish(&self, snapshot: Arc<Snapshot>) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        let previous = slot.replace(snapshot.clone());
        tracing::info!(
            database = %snapshot.database,
            previous = ?previous.as_ref().map(|p| p.database.as_str()),
            tables = snapshot.table_count,
            "catalog snapshot installed"
        );
    }

    /// Persist a freshly introspected snapshot and make it the cached one.
    pub async fn install(&self, snapshot: Snapshot) -> Result<Arc<Snapshot>, AppError> {
        snapshot.check_unique_tables()?;
        self.store.save(&snapshot).await?;
        let snapshot = Arc::new(snapshot);
        self.publish(snapshot.clone());
        Ok(snapshot)
    }

    /// Snapshot for `database`: the cached one when it matches, else the persisted one,
    /// else an empty one. `None` for names that are not known databases.
    pub async fn snapshot_for(&self, database: &str) -> Result<Option<Arc<Snapshot>>, AppError> {
        if !self.is_known_database(database) {
            tracing::debug!(database = %database, "unknown database");
            return Ok(None);
        }
        if let Some(current) = self.current() {
            if current.database == database {
                return Ok(Some(current));
            }
        }
        let snapshot = match self.store.load(database).await {
            Ok(Some(s)) if s.database == database => s,
            Ok(Some(s)) => {
                tracing::warn!(database = %database, found = %s.database, "persisted snapshot names another database; ignoring");
                return Ok(Some(Arc::new(Snapshot::empty(database))));
            }
            Ok(None) => {
                tracing::warn!(database = %database, "no persisted snapshot; serving no tables");
                return Ok(Some(Arc::new(Snapshot::empty(database))));
            }
            Err(e) => {
                tracing::warn!(database = %database, error = %e, "persisted snapshot unreadable; serving no tables");
                return Ok(Some(Arc::new(Snapshot::empty(database))));
            }
        };
        snapshot.check_unique_tables()?;
        let snapshot = Arc::new(snapshot);
        self.publish(snapshot.clone());
        Ok(Some(snapshot))
    }

    /// Look up `table` in `database`. `Ok(None)` covers unknown databases, databases
    /// with nothing persisted, and tables that do not exist.
    pub async fn resolve_table(&self, database: &str, table: &str) -> Result<Option<ResolvedTable>, AppError> {
        let Some(snapshot) = self.snapshot_for(database).await? else {
            return Ok(None);
        };
        Ok(snapshot.table(table).map(|t| ResolvedTable {
            database: snapshot.database.clone(),
            schema: self.schema.clone(),
            table: t.clone(),
        }))
    }
}
