//! Resource loader that orchestrates network fetching with a cache fallback.

use chrono::Utc;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::storage::PersistentCache;
use super::traits::{LoadResult, Resource};
use crate::error::{InvalidKey, ResourceError};
use crate::fetch::Fetcher;

/// Loads resources network-first, writing through to the cache and falling
/// back to the cached copy when the network fails.
///
/// 1. Fetch from the network
/// 2. If the bytes decode, store them in the cache and return `Fresh`
/// 3. Otherwise decode the cached bytes, if any, and return `Stale`
/// 4. With no usable cached copy, return `Unavailable`
///
/// The cache is never consulted before the network.
pub struct ResourceLoader<T> {
  cache: Arc<dyn PersistentCache>,
  fetcher: Arc<dyn Fetcher>,
  _resource: PhantomData<fn() -> T>,
}

impl<T: Resource> ResourceLoader<T> {
  /// Create a loader on top of a shared cache and fetcher.
  pub fn new(cache: Arc<dyn PersistentCache>, fetcher: Arc<dyn Fetcher>) -> Self {
    Self {
      cache,
      fetcher,
      _resource: PhantomData,
    }
  }

  /// Reject source ids that can never be fetched.
  pub fn validate(source_id: &str) -> Result<(), InvalidKey> {
    if source_id.trim().is_empty() {
      return Err(InvalidKey::new(source_id, "source id is empty"));
    }
    match url::Url::parse(source_id) {
      Ok(url) if url.has_host() => Ok(()),
      Ok(_) => Err(InvalidKey::new(source_id, "URL has no host")),
      Err(_) => Err(InvalidKey::new(source_id, "not an absolute URL")),
    }
  }

  /// Load the best available value for a source id.
  ///
  /// Network and decode failures are absorbed; only an invalid source id is
  /// reported as an error.
  pub async fn load(&self, source_id: &str) -> Result<LoadResult<T>, InvalidKey> {
    Self::validate(source_id)?;
    let key = T::cache_key(source_id);

    let err = match self.fetch_fresh(source_id).await {
      Ok((value, bytes)) => {
        self.write_through(&key, bytes).await;
        info!(namespace = T::namespace(), source_id, "loaded from network");
        return Ok(LoadResult::Fresh(value));
      }
      Err(err) => err,
    };

    warn!(
      namespace = T::namespace(),
      source_id,
      error = %err,
      "network load failed, falling back to cache"
    );

    match self.read_cached(&key).await {
      Ok(value) => {
        self.log_stale_age(&key).await;
        Ok(LoadResult::Stale(value))
      }
      Err(ResourceError::CacheMiss) => {
        debug!(key = %key, "no cached copy");
        Ok(LoadResult::Unavailable)
      }
      Err(err) => {
        warn!(key = %key, error = %err, "cached copy unusable");
        Ok(LoadResult::Unavailable)
      }
    }
  }

  async fn fetch_fresh(&self, source_id: &str) -> Result<(T, Vec<u8>), ResourceError> {
    let bytes = self.fetcher.fetch(source_id).await?;
    let value = T::decode(&bytes)?;
    Ok((value, bytes))
  }

  /// Persist freshly fetched bytes. Failures are logged, never surfaced.
  async fn write_through(&self, key: &str, bytes: Vec<u8>) {
    let cache = Arc::clone(&self.cache);
    let owned_key = key.to_string();
    let result = tokio::task::spawn_blocking(move || cache.put(&owned_key, &bytes)).await;

    match result {
      Ok(Ok(())) => debug!(key, "cache updated"),
      Ok(Err(e)) => warn!(key, error = %e, "failed to write cache entry"),
      Err(e) => warn!(key, error = %e, "cache write task failed"),
    }
  }

  async fn read_cached(&self, key: &str) -> Result<T, ResourceError> {
    let cache = Arc::clone(&self.cache);
    let owned_key = key.to_string();
    let bytes = tokio::task::spawn_blocking(move || cache.get(&owned_key))
      .await
      .map_err(|e| ResourceError::Storage(e.to_string()))?
      .map_err(|e| ResourceError::Storage(e.to_string()))?
      .ok_or(ResourceError::CacheMiss)?;

    Ok(T::decode(&bytes)?)
  }

  async fn log_stale_age(&self, key: &str) {
    let cache = Arc::clone(&self.cache);
    let owned_key = key.to_string();
    if let Ok(Ok(Some(cached_at))) =
      tokio::task::spawn_blocking(move || cache.cached_at(&owned_key)).await
    {
      let age = Utc::now() - cached_at;
      info!(key, age_secs = age.num_seconds(), "serving stale copy from cache");
    } else {
      info!(key, "serving stale copy from cache");
    }
  }
}

impl<T> Clone for ResourceLoader<T> {
  fn clone(&self) -> Self {
    Self {
      cache: Arc::clone(&self.cache),
      fetcher: Arc::clone(&self.fetcher),
      _resource: PhantomData,
    }
  }
}
