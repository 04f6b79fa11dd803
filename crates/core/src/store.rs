//! SessionStore trait — the abstraction over the TTL-backed key-value store.
//!
//! The store is the only mutable shared state in the system and the sole
//! arbiter of which conversations are in flight: absence of a key means "no
//! active session". Implementations live in `corvid-store`.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::StoreError;
use crate::session::SessionFields;

/// Keyed, field-structured, TTL-expiring storage.
///
/// All operations are individually durable; the trait makes no cross-field
/// atomicity promise beyond what the backing store offers per key. Callers
/// that need read-modify-write consistency must serialize access per key
/// themselves (see the routers' key locks).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Fetch the full field map for a key. An empty map means no session.
    async fn get(&self, key: &str) -> Result<SessionFields, StoreError>;

    /// Write fields under a key. When `ttl` is given, the key's expiry is
    /// (re)set; callers pass it only at session creation.
    async fn set_fields(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl: Option<Duration>,
    ) -> Result<(), StoreError>;

    /// Add a single field to an existing key without touching its expiry.
    async fn append_field(&self, key: &str, name: &str, value: &str) -> Result<(), StoreError> {
        self.set_fields(key, &[(name.to_string(), value.to_string())], None)
            .await
    }

    /// Remove the key and all its fields. Deleting an absent key is not an
    /// error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
