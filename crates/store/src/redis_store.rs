//! Redis-backed session store.
//!
//! Sessions are Redis hashes under the `<team>:<channel>` key; TTLs use the
//! key's native expiry so a stalled interaction is dropped by Redis itself
//! with no reaper on our side.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use corvid_core::error::StoreError;
use corvid_core::session::SessionFields;
use corvid_core::store::SessionStore;

/// A session store over a Redis instance.
///
/// The connection manager reconnects transparently; individual command
/// failures surface as [`StoreError`] scoped to one conversation.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect and verify the server responds before serving traffic.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::Connection(e.to_string()))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let mut con = manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut con)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        debug!(url = %url, "Connected to redis");
        Ok(Self { manager })
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<SessionFields, StoreError> {
        let mut con = self.manager.clone();
        let fields: HashMap<String, String> =
            con.hgetall(key).await.map_err(|e| StoreError::Read {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(fields)
    }

    async fn set_fields(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let mut con = self.manager.clone();
        let _: () = con
            .hset_multiple(key, fields)
            .await
            .map_err(|e| StoreError::Write {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        if let Some(ttl) = ttl {
            let _: () = con
                .expire(key, ttl.as_secs() as i64)
                .await
                .map_err(|e| StoreError::Write {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut con = self.manager.clone();
        let _: () = con.del(key).await.map_err(|e| StoreError::Delete {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
