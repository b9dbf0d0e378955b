//! Shared application state.

use std::sync::Arc;

use crate::config::Config;
use crate::store::Store;

/// State shared across all request handlers. The store is held behind the
/// trait object so the same routers run over Postgres in production and the
/// in-memory store in tests.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Arc<Config>) -> Self {
        Self { store, config }
    }
}
