use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::trace;

use crate::config::TrackerConfig;
use crate::tracker::errors::DirectoryError;
use crate::types::{ClientId, UserId};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct UserContext {
    pub client_id: ClientId,
    pub user_id: UserId
}

/// Resolves which client a user belongs to.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// `Ok(None)` when the user is unknown.
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserContext>, DirectoryError>;
}

/// Fronts a directory with a bounded, expiring cache of resolved users.
///
/// Unknown users and failed lookups are not cached.
pub struct CachedUserDirectory<D> {
    inner: D,
    cache: Cache<UserId, UserContext>
}

impl<D: UserDirectory> CachedUserDirectory<D> {
    pub fn new(inner: D, capacity: u64, time_to_live: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(time_to_live)
                .build()
        }
    }

    pub fn from_config(inner: D, config: &TrackerConfig) -> Self {
        Self::new(inner, config.user_cache_capacity, config.user_cache_ttl)
    }
}

#[async_trait]
impl<D: UserDirectory> UserDirectory for CachedUserDirectory<D> {
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserContext>, DirectoryError> {
        if let Some(user) = self.cache.get(&user_id).await {
            trace!("User [{user_id}] resolved from cache");
            return Ok(Some(user));
        }

        let user = self.inner.find_user(user_id).await?;

        if let Some(user) = user {
            self.cache.insert(user_id, user).await;
        }

        Ok(user)
    }
}
