//! Tablekit: generic CRUD over any table of any database on a PostgreSQL server,
//! driven by schema snapshots discovered at runtime.

pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod pools;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod telemetry;

pub use bootstrap::{bootstrap, refresh_database, BootstrapReport};
pub use catalog::{Catalog, ResolvedTable, Snapshot, SnapshotStore};
pub use config::Settings;
pub use error::{AppError, ConfigError, IntrospectError};
pub use pools::PoolRegistry;
pub use routes::{app, common_routes, table_routes};
pub use service::CrudService;
pub use state::AppState;
pub use telemetry::init_tracing;
