use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use super::types::{FeedDocument, Record};
use crate::cache::{LoadResult, ResourceLoader};
use crate::error::InvalidKey;

/// Loads the catalog feed and publishes the current record list.
///
/// Subscribers see the list replaced wholesale on every `Fresh` or `Stale`
/// load. An `Unavailable` load leaves whatever was published before.
pub struct FeedLoader {
  resources: ResourceLoader<FeedDocument>,
  url: String,
  records: watch::Sender<Arc<Vec<Record>>>,
}

impl FeedLoader {
  pub fn new(resources: ResourceLoader<FeedDocument>, url: impl Into<String>) -> Self {
    let (records, _) = watch::channel(Arc::new(Vec::new()));
    Self {
      resources,
      url: url.into(),
      records,
    }
  }

  pub fn url(&self) -> &str {
    &self.url
  }

  /// Receiver notified whenever the published list changes.
  pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Record>>> {
    self.records.subscribe()
  }

  /// The currently published records.
  pub fn records(&self) -> Arc<Vec<Record>> {
    Arc::clone(&self.records.borrow())
  }

  /// Load the feed and publish its records.
  pub async fn load(&self) -> Result<LoadResult<FeedDocument>, InvalidKey> {
    let result = self.resources.load(&self.url).await?;

    match result.value() {
      Some(doc) => {
        info!(
          records = doc.results.len(),
          source = result.source_label(),
          "publishing feed"
        );
        self.records.send_replace(Arc::new(doc.results.clone()));
      }
      None => debug!("feed unavailable, keeping previous records"),
    }

    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{MemoryCache, NoopCache, PersistentCache, SqliteCache};
  use crate::feed::types::fixtures::{CHEWBACCA_FEED, TRIO_FEED};
  use crate::fetch::testing::ScriptedFetcher;

  const FEED_URL: &str = "http://x/project.json";

  fn feed_loader(cache: Arc<dyn PersistentCache>, fetcher: Arc<ScriptedFetcher>) -> FeedLoader {
    FeedLoader::new(ResourceLoader::new(cache, fetcher), FEED_URL)
  }

  #[tokio::test]
  async fn test_chewbacca_feed() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.serve(FEED_URL, CHEWBACCA_FEED);
    let loader = feed_loader(Arc::new(MemoryCache::new()), fetcher);

    let result = loader.load().await.unwrap();

    assert!(result.is_fresh());
    let records = loader.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Chewbacca");
  }

  #[tokio::test]
  async fn test_second_load_offline_is_stale_and_identical() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.serve(FEED_URL, TRIO_FEED);
    let loader = feed_loader(Arc::new(MemoryCache::new()), fetcher.clone());

    let first = loader.load().await.unwrap();
    fetcher.set_offline(true);
    let second = loader.load().await.unwrap();

    assert!(first.is_fresh());
    assert!(second.is_stale());
    assert_eq!(first.value(), second.value());
  }

  #[tokio::test]
  async fn test_unavailable_keeps_previous_records() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.serve(FEED_URL, TRIO_FEED);
    let loader = feed_loader(Arc::new(NoopCache), fetcher.clone());

    loader.load().await.unwrap();
    fetcher.set_offline(true);
    let result = loader.load().await.unwrap();

    assert!(result.is_unavailable());
    assert_eq!(loader.records().len(), 3);
  }

  #[tokio::test]
  async fn test_first_run_offline_is_empty() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.set_offline(true);
    let loader = feed_loader(Arc::new(MemoryCache::new()), fetcher);

    assert!(loader.load().await.unwrap().is_unavailable());
    assert!(loader.records().is_empty());
  }

  #[tokio::test]
  async fn test_subscriber_sees_replacement() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.serve(FEED_URL, CHEWBACCA_FEED);
    let loader = feed_loader(Arc::new(MemoryCache::new()), fetcher.clone());
    let mut rx = loader.subscribe();

    loader.load().await.unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().len(), 1);

    fetcher.serve(FEED_URL, TRIO_FEED);
    loader.load().await.unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().len(), 3);
  }

  #[tokio::test]
  async fn test_malformed_feed_falls_back_to_cache() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.serve(FEED_URL, CHEWBACCA_FEED);
    let loader = feed_loader(Arc::new(MemoryCache::new()), fetcher.clone());
    loader.load().await.unwrap();

    fetcher.serve(FEED_URL, "<html>maintenance</html>");
    let result = loader.load().await.unwrap();

    assert!(result.is_stale());
    assert_eq!(loader.records()[0].name, "Chewbacca");
  }

  #[tokio::test]
  async fn test_cached_feed_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");

    {
      let fetcher = Arc::new(ScriptedFetcher::new());
      fetcher.serve(FEED_URL, CHEWBACCA_FEED);
      let cache = Arc::new(SqliteCache::open_at(&path).unwrap());
      assert!(feed_loader(cache, fetcher).load().await.unwrap().is_fresh());
    }

    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.set_offline(true);
    let cache = Arc::new(SqliteCache::open_at(&path).unwrap());
    let loader = feed_loader(cache, fetcher);

    assert!(loader.load().await.unwrap().is_stale());
    assert_eq!(loader.records()[0].name, "Chewbacca");
  }
}
