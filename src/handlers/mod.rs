//! HTTP handlers for table CRUD and database listing.

pub mod databases;
pub mod table;
pub use databases::*;
pub use table::*;
