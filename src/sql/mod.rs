//! Validated query builder: identifiers from the catalog only, values as parameters.

mod builder;
pub mod params;
pub mod validate;
pub use builder::*;
pub use params::*;
pub use validate::{check_identifier, is_safe_identifier, unknown_fields, validate_fields};
