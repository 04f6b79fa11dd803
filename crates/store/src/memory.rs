//! In-memory store — useful for testing and single-process development.
//!
//! TTL handling mirrors the external store's semantics: an entry past its
//! deadline is invisible to `get` and lazily removed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use corvid_core::error::StoreError;
use corvid_core::session::SessionFields;
use corvid_core::store::SessionStore;

struct Entry {
    fields: SessionFields,
    deadline: Option<Instant>,
}

impl Entry {
    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// An in-memory session store keyed by `<team>:<channel>`.
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<SessionFields, StoreError> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.expired() => return Ok(entry.fields.clone()),
                None => return Ok(SessionFields::new()),
                Some(_) => {} // expired, reap below
            }
        }
        self.entries.write().await.remove(key);
        Ok(SessionFields::new())
    }

    async fn set_fields(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .and_modify(|e| {
                if e.expired() {
                    e.fields.clear();
                    e.deadline = None;
                }
            })
            .or_insert_with(|| Entry {
                fields: SessionFields::new(),
                deadline: None,
            });

        for (name, value) in fields {
            entry.fields.insert(name.clone(), value.clone());
        }
        if let Some(ttl) = ttl {
            entry.deadline = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
