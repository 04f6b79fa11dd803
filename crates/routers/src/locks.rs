//! Per-conversation-key serialization.
//!
//! The session store offers no cross-field transaction, so two
//! near-simultaneous events for one key (a double-clicked button, a stray
//! message while a webhook is mid-flight) could interleave their
//! read-modify-write sequences and corrupt session fields. Both routers
//! take the key's lock for the full read → transition → write span.
//!
//! This closes the race within a single process. Deployments that split
//! the stream bot and the webhook server into separate processes fall back
//! to the store's last-write-wins behavior.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A registry of one async mutex per conversation key.
///
/// The map grows with distinct conversation keys seen; entries are a few
/// dozen bytes each and a conversation key space is small in practice.
pub struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Take the lock for a key, waiting if the other entry point holds it.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

impl Default for KeyLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn same_key_is_serialized() {
        let locks = Arc::new(KeyLocks::new());
        let running = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let locks = locks.clone();
            let running = running.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("T1:D1").await;
                let concurrent = running.fetch_add(1, Ordering::SeqCst);
                assert_eq!(concurrent, 0, "two holders inside one key's lock");
                tokio::task::yield_now().await;
                running.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyLocks::new();
        let _a = locks.acquire("T1:D1").await;
        // Must not deadlock:
        let _b = locks.acquire("T1:D2").await;
    }
}
