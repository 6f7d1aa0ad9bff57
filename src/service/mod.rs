//! CrudService: runs validated, built statements against a database pool.

mod crud;
pub use crud::CrudService;
