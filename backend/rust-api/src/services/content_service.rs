use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::errors::StoreError;
use crate::models::QuizConfig;
use crate::storage::ContentStore;

/// Cache over assembled quiz configs, keyed by the owning store's
/// source key. Writers must call [`ConfigCache::invalidate`] after a
/// successful replace, otherwise readers keep serving the old config.
pub struct ConfigCache {
    entries: Mutex<HashMap<String, Arc<QuizConfig>>>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<QuizConfig>> {
        self.entries
            .lock()
            .expect("config cache lock poisoned")
            .get(key)
            .cloned()
    }

    pub fn put(&self, key: String, config: Arc<QuizConfig>) {
        self.entries
            .lock()
            .expect("config cache lock poisoned")
            .insert(key, config);
    }

    pub fn invalidate(&self, key: &str) {
        self.entries
            .lock()
            .expect("config cache lock poisoned")
            .remove(key);
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("config cache lock poisoned")
            .clear();
    }
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ContentService {
    store: Arc<dyn ContentStore>,
    cache: Arc<ConfigCache>,
}

impl ContentService {
    pub fn new(store: Arc<dyn ContentStore>, cache: Arc<ConfigCache>) -> Self {
        Self { store, cache }
    }

    /// Assembled quiz config, cached per source. Repeated reads for the
    /// same source never hit the store twice between invalidations.
    pub async fn get_quiz_config(&self) -> Result<Arc<QuizConfig>, StoreError> {
        let key = self.store.source_key();
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let config = Arc::new(self.store.get_quiz_config().await?);
        self.cache.put(key, Arc::clone(&config));
        Ok(config)
    }

    pub async fn replace_config(&self, config: &QuizConfig) -> Result<(), StoreError> {
        self.store.replace_config(config).await?;
        self.cache.invalidate(&self.store.source_key());
        tracing::info!("Quiz config replaced; cache invalidated");
        Ok(())
    }
}
