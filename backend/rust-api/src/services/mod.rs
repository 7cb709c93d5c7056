use std::sync::Arc;

use crate::config::Config;
use crate::services::content_service::ConfigCache;
use crate::storage::{ContentStore, GroupDirectory, SessionStore};

pub struct AppState {
    pub config: Config,
    pub sessions: Arc<dyn SessionStore>,
    pub content: Arc<dyn ContentStore>,
    pub groups: Arc<dyn GroupDirectory>,
    pub content_cache: Arc<ConfigCache>,
}

impl AppState {
    pub fn new(
        config: Config,
        sessions: Arc<dyn SessionStore>,
        content: Arc<dyn ContentStore>,
        groups: Arc<dyn GroupDirectory>,
    ) -> Self {
        Self {
            config,
            sessions,
            content,
            groups,
            content_cache: Arc::new(ConfigCache::new()),
        }
    }
}

pub mod content_service;
pub mod dashboard_service;
pub mod group_service;
pub mod session_service;
