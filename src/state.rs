//! Shared application state for all routes.

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::pools::PoolRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub pools: Arc<PoolRegistry>,
    pub settings: Arc<Settings>,
}
