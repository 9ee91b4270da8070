use crate::config::Config;
use crate::store::{self, Store, StoreResult};
use std::future::Future;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Await a store call under the configured deadline
    pub async fn timed<T, F>(&self, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        store::with_deadline(self.config.db_timeout, call).await
    }
}
