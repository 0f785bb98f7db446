//! In-memory session store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::*;
use playground_types::{PlaygroundError, Result};

/// In-memory session store (for testing and ephemeral use).
pub struct MemoryStore {
    values: Mutex<HashMap<SessionKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { values: Mutex::new(HashMap::new()) }
    }

    fn values(&self) -> Result<MutexGuard<'_, HashMap<SessionKey, String>>> {
        self.values
            .lock()
            .map_err(|_| PlaygroundError::Storage("session store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: SessionKey) -> Result<Option<String>> {
        Ok(self.values()?.get(&key).cloned())
    }

    async fn set(&self, key: SessionKey, value: &str) -> Result<()> {
        self.values()?.insert(key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: SessionKey) -> Result<()> {
        self.values()?.remove(&key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.values()?.clear();
        Ok(())
    }
}
