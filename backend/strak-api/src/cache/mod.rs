/// Redis read-through cache for posts and profiles
///
/// Cached values are viewer-independent JSON documents stored with a TTL.
/// Viewer-specific fields (`liked_by_me`, `is_following`) and visibility are
/// always resolved against the database after a cache read.
///
/// Fills are guarded by a per-key generation counter: a reader takes a
/// [`FillTicket`] before going to the database, every invalidation bumps the
/// generation, and a fill whose ticket is older than the current generation
/// is dropped. A slow read-through can therefore never overwrite a newer
/// invalidation with stale counts.
///
/// Every operation is best effort: when Redis is absent or failing the
/// caller falls back to the database and the request still succeeds.
use once_cell::sync::Lazy;
use redis::{aio::ConnectionManager, AsyncCommands, Script};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::metrics::record_cache_event;
use crate::models::{Post, Profile};

const KEY_PREFIX: &str = "strak:cache";
const REDIS_TIMEOUT: Duration = Duration::from_millis(250);
/// Generations outlive any entry they guard.
const GENERATION_TTL_SECS: u64 = 86_400;

/// KEYS[1] entry, KEYS[2] generation; ARGV ticket, payload, ttl.
static FILL_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        if tonumber(redis.call('GET', KEYS[2]) or '0') ~= tonumber(ARGV[1]) then
            return 0
        end
        redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
        return 1
        "#,
    )
});

/// KEYS holds N entries followed by their N generations; ARGV generation ttl.
static INVALIDATE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local n = #KEYS / 2
        for i = 1, n do
            redis.call('DEL', KEYS[i])
            redis.call('INCR', KEYS[n + i])
            redis.call('EXPIRE', KEYS[n + i], ARGV[1])
        end
        return n
        "#,
    )
});

/// Generation observed before a database read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTicket(i64);

#[derive(Clone)]
pub struct ContentCache {
    redis: Option<ConnectionManager>,
    ttl_secs: u64,
}

impl ContentCache {
    pub fn new(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self {
            redis: Some(redis),
            ttl_secs,
        }
    }

    /// Cache that never stores anything.
    pub fn disabled() -> Self {
        Self {
            redis: None,
            ttl_secs: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.redis.is_some()
    }

    pub fn post_key(post_id: Uuid) -> String {
        format!("{KEY_PREFIX}:post:{post_id}")
    }

    pub fn profile_key(user_id: Uuid) -> String {
        format!("{KEY_PREFIX}:profile:{user_id}")
    }

    /// Redis round trip used by the readiness probe.
    pub async fn ping(&self) -> Option<Result<(), redis::RedisError>> {
        let mut conn = self.redis.clone()?;
        let result = tokio::time::timeout(
            REDIS_TIMEOUT,
            redis::cmd("PING").query_async::<_, String>(&mut conn),
        )
        .await;
        Some(match result {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(timeout_error()),
        })
    }

    pub fn generation_key(key: &str) -> String {
        format!("{key}:gen")
    }

    pub async fn get_post(&self, post_id: Uuid) -> Option<Post> {
        self.get_json("post", &Self::post_key(post_id)).await
    }

    /// Take before loading the post from the database.
    pub async fn post_ticket(&self, post_id: Uuid) -> Option<FillTicket> {
        self.ticket(&Self::post_key(post_id)).await
    }

    pub async fn set_post(&self, post: &Post, ticket: FillTicket) {
        self.set_json("post", &Self::post_key(post.id), post, ticket)
            .await;
    }

    pub async fn invalidate_post(&self, post_id: Uuid) {
        self.delete(&[Self::post_key(post_id)]).await;
    }

    pub async fn invalidate_posts(&self, post_ids: &[Uuid]) {
        let keys: Vec<String> = post_ids.iter().copied().map(Self::post_key).collect();
        self.delete(&keys).await;
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Option<Profile> {
        self.get_json("profile", &Self::profile_key(user_id)).await
    }

    /// Take before loading the profile from the database.
    pub async fn profile_ticket(&self, user_id: Uuid) -> Option<FillTicket> {
        self.ticket(&Self::profile_key(user_id)).await
    }

    pub async fn set_profile(&self, profile: &Profile, ticket: FillTicket) {
        self.set_json("profile", &Self::profile_key(profile.id), profile, ticket)
            .await;
    }

    pub async fn invalidate_profiles(&self, user_ids: &[Uuid]) {
        let keys: Vec<String> = user_ids.iter().copied().map(Self::profile_key).collect();
        self.delete(&keys).await;
    }

    async fn ticket(&self, key: &str) -> Option<FillTicket> {
        let mut conn = self.redis.clone()?;
        let generation_key = Self::generation_key(key);

        let result = tokio::time::timeout(
            REDIS_TIMEOUT,
            conn.get::<_, Option<i64>>(&generation_key),
        )
        .await;
        match result {
            Ok(Ok(generation)) => Some(FillTicket(generation.unwrap_or(0))),
            Ok(Err(err)) => {
                warn!(%key, "cache generation read failed: {}", err);
                None
            }
            Err(_) => {
                warn!(%key, "cache generation read timed out");
                None
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, entity: &str, key: &str) -> Option<T> {
        let mut conn = self.redis.clone()?;

        let result =
            tokio::time::timeout(REDIS_TIMEOUT, conn.get::<_, Option<String>>(key)).await;
        match result {
            Ok(Ok(Some(raw))) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(%key, "cache hit");
                    record_cache_event(entity, "hit");
                    Some(value)
                }
                Err(err) => {
                    warn!(%key, "discarding undecodable cache entry: {}", err);
                    record_cache_event(entity, "error");
                    self.delete(&[key.to_string()]).await;
                    None
                }
            },
            Ok(Ok(None)) => {
                record_cache_event(entity, "miss");
                None
            }
            Ok(Err(err)) => {
                warn!(%key, "cache read failed: {}", err);
                record_cache_event(entity, "error");
                None
            }
            Err(_) => {
                warn!(%key, "cache read timed out");
                record_cache_event(entity, "error");
                None
            }
        }
    }

    async fn set_json<T: Serialize>(&self, entity: &str, key: &str, value: &T, ticket: FillTicket) {
        let Some(mut conn) = self.redis.clone() else {
            return;
        };

        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%key, "failed to serialize cache entry: {}", err);
                return;
            }
        };

        let result = tokio::time::timeout(
            REDIS_TIMEOUT,
            FILL_SCRIPT
                .key(key)
                .key(Self::generation_key(key))
                .arg(ticket.0)
                .arg(payload)
                .arg(self.ttl_secs)
                .invoke_async::<_, i64>(&mut conn),
        )
        .await;
        match result {
            Ok(Ok(1)) => {}
            Ok(Ok(_)) => {
                debug!(%key, entity, "cache fill skipped, entry invalidated meanwhile");
                record_cache_event(entity, "stale_fill");
            }
            _ => {
                debug!(%key, entity, "cache write failed");
                record_cache_event(entity, "write_error");
            }
        }
    }

    async fn delete(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        let Some(mut conn) = self.redis.clone() else {
            return;
        };

        let generations: Vec<String> = keys.iter().map(|key| Self::generation_key(key)).collect();
        let mut invocation = INVALIDATE_SCRIPT.prepare_invoke();
        invocation.key(keys).key(generations).arg(GENERATION_TTL_SECS);

        let result = tokio::time::timeout(
            REDIS_TIMEOUT,
            invocation.invoke_async::<_, i64>(&mut conn),
        )
        .await;
        match result {
            Ok(Ok(_)) => debug!(count = keys.len(), "cache invalidated"),
            Ok(Err(err)) => warn!(?keys, "cache invalidation failed: {}", err),
            Err(_) => warn!(?keys, "cache invalidation timed out"),
        }
    }
}

fn timeout_error() -> redis::RedisError {
    redis::RedisError::from((redis::ErrorKind::IoError, "redis operation timed out"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        let id = Uuid::nil();
        assert_eq!(
            ContentCache::post_key(id),
            "strak:cache:post:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            ContentCache::profile_key(id),
            "strak:cache:profile:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            ContentCache::generation_key(&ContentCache::post_key(id)),
            "strak:cache:post:00000000-0000-0000-0000-000000000000:gen"
        );
    }

    #[tokio::test]
    async fn disabled_cache_is_a_no_op() {
        let cache = ContentCache::disabled();
        assert!(!cache.is_enabled());
        assert!(cache.get_post(Uuid::new_v4()).await.is_none());
        assert!(cache.get_profile(Uuid::new_v4()).await.is_none());
        assert!(cache.ping().await.is_none());
        assert!(cache.post_ticket(Uuid::new_v4()).await.is_none());
        cache.invalidate_posts(&[Uuid::new_v4()]).await;
        cache.invalidate_profiles(&[]).await;
    }
}
