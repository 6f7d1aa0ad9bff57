//! Schema catalog: snapshot model, introspection, persistence and the process-wide cache.

mod cache;
pub mod introspect;
mod snapshot;
mod store;

pub use cache::{Catalog, ResolvedTable};
pub use introspect::{introspect, list_databases, Introspection, PgSchemaSource, SchemaSource};
pub use snapshot::{ColumnDef, Snapshot, TableDef};
pub use store::SnapshotStore;
