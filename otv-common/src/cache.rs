//! Redis-backed translation cache and per-key enqueue locks
//!
//! Two disjoint key namespaces share one Redis instance:
//! - `translation:{kind}:{id}:{lang}` — serialized completed translation
//!   blocks, written through after a store hit or worker completion.
//! - `lock:translation:{kind}:{id}:{lang}` — short-lived mutex markers
//!   written only by the catalog service on enqueue and deleted only by the
//!   worker when the job finishes (either way).
//!
//! The lock TTL bounds how long a crashed worker can block re-enqueueing.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::ItemKind;

/// TTL for cached completed translations.
pub const TRANSLATION_CACHE_TTL: Duration = Duration::from_secs(3600);

/// TTL for enqueue lock markers.
pub const TRANSLATION_LOCK_TTL: Duration = Duration::from_secs(300);

/// Key under which a completed translation for (kind, id, lang) is cached.
pub fn translation_key(kind: ItemKind, item_id: i64, language_code: &str) -> String {
    format!("translation:{}:{}:{}", kind, item_id, language_code)
}

/// Key of the enqueue lock for (kind, id, lang).
pub fn translation_lock_key(kind: ItemKind, item_id: i64, language_code: &str) -> String {
    format!("lock:{}", translation_key(kind, item_id, language_code))
}

/// Minimal cache contract used by the orchestrator and the worker.
///
/// Kept narrow so tests can substitute an in-memory double and assert on
/// call counts.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Fetch a value; `None` on a miss.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value with an expiry.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Atomically store a value only if the key does not exist yet.
    /// Returns whether this caller won the key.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Redis implementation over a reconnecting multiplexed connection.
///
/// `ConnectionManager` is cheap to clone; each operation clones it to get a
/// mutable handle, so one `RedisCache` can be shared across request tasks.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::Cache(format!("Invalid Redis URL: {}", e)))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::Cache(format!("Failed to connect to Redis: {}", e)))?;
        Ok(Self { conn })
    }

    /// Build a cache around an existing connection (shared with the queue).
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        // SET key value NX EX ttl — one round trip, atomic on the server.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_are_namespaced_per_item_and_language() {
        assert_eq!(
            translation_key(ItemKind::Channel, 7, "fr"),
            "translation:channel:7:fr"
        );
        assert_eq!(
            translation_lock_key(ItemKind::Package, 12, "de"),
            "lock:translation:package:12:de"
        );
    }
}
