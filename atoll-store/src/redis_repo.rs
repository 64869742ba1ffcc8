use async_trait::async_trait;
use atoll_core::repository::{DraftStore, SavedBookingStore};
use atoll_core::BoxError;
use redis::{AsyncCommands, RedisResult};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
    draft_ttl_seconds: u64,
}

fn draft_key(id: Uuid) -> String {
    format!("draft:{}", id)
}

fn saved_key(client_id: &str) -> String {
    format!("saved:{}", client_id)
}

fn entry_id(entry: &Value) -> Option<Uuid> {
    entry.get("id")?.as_str()?.parse().ok()
}

impl RedisClient {
    pub async fn new(connection_string: &str, draft_ttl_seconds: u64) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self {
            client,
            draft_ttl_seconds,
        })
    }

    /// Fixed-window counter. True while `key` is under `limit` for the current window.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }

    pub async fn ping(&self) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async(&mut conn).await
    }
}

#[async_trait]
impl DraftStore for RedisClient {
    async fn put_draft(&self, id: Uuid, draft: &Value) -> Result<(), BoxError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(draft)?;
        // Each write extends the session.
        conn.set_ex::<_, _, ()>(draft_key(id), payload, self.draft_ttl_seconds)
            .await?;
        debug!("Draft {} stored", id);
        Ok(())
    }

    async fn get_draft(&self, id: Uuid) -> Result<Option<Value>, BoxError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = conn.get(draft_key(id)).await?;
        match payload {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn delete_draft(&self, id: Uuid) -> Result<(), BoxError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(draft_key(id)).await?;
        Ok(())
    }
}

#[async_trait]
impl SavedBookingStore for RedisClient {
    async fn push_saved(&self, client_id: &str, entry: &Value, cap: usize) -> Result<(), BoxError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = saved_key(client_id);
        let payload = serde_json::to_string(entry)?;
        let last = cap.max(1) as isize - 1;

        let _: () = redis::pipe()
            .atomic()
            .lpush(&key, payload)
            .ignore()
            .ltrim(&key, 0, last)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn list_saved(&self, client_id: &str) -> Result<Vec<Value>, BoxError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Vec<String> = conn.lrange(saved_key(client_id), 0, -1).await?;

        Ok(raw
            .into_iter()
            .filter_map(|item| match serde_json::from_str(&item) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Skipping malformed saved booking for {}: {}", client_id, e);
                    None
                }
            })
            .collect())
    }

    async fn remove_saved(&self, client_id: &str, target: Uuid) -> Result<bool, BoxError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = saved_key(client_id);
        let raw: Vec<String> = conn.lrange(&key, 0, -1).await?;

        let Some(item) = raw.into_iter().find(|item| {
            serde_json::from_str::<Value>(item)
                .ok()
                .and_then(|v| entry_id(&v))
                == Some(target)
        }) else {
            return Ok(false);
        };

        let removed: i64 = conn.lrem(&key, 1, item).await?;
        Ok(removed > 0)
    }
}
