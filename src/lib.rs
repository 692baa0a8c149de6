pub mod config;
pub mod rest;
pub mod storage;
pub mod tags;
pub mod tasks;

use std::sync::Arc;

use config::ServerConfig;
use storage::Storage;
use tags::TagStore;
use tasks::TaskStore;

/// Shared application state passed to every request handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub storage: Arc<Storage>,
    /// Task CRUD over the shared pool.
    pub tasks: Arc<TaskStore>,
    /// Tag read/delete over the shared pool.
    pub tags: Arc<TagStore>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    /// Wire the stores onto the storage pool.
    pub fn new(config: Arc<ServerConfig>, storage: Arc<Storage>) -> Self {
        let pool = storage.pool();
        Self {
            config,
            storage,
            tasks: Arc::new(TaskStore::new(pool.clone())),
            tags: Arc::new(TagStore::new(pool)),
            started_at: std::time::Instant::now(),
        }
    }
}
