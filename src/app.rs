//! Command-line front end over the feed and image loaders.

use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::cache::{
  LoadResult, MemoryCache, NoopCache, PersistentCache, Resource, ResourceLoader, SqliteCache,
};
use crate::config::{CacheConfig, CacheMode, Config};
use crate::feed::{detail_lines, filter_records, find_record, FeedLoader, Record};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::image::{ImageBytes, ImageLoader, PLACEHOLDER_GIF};

/// How often background image loads are polled
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Application state: one shared cache, one feed loader, and the image
/// resources every row loader is built from.
pub struct App {
  feed: FeedLoader,
  images: ResourceLoader<ImageBytes>,
  placeholder: ImageBytes,
}

impl App {
  pub fn new(config: &Config) -> Result<Self> {
    let cache = open_cache(&config.cache)?;
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(config)?);
    Self::with_parts(config, cache, fetcher)
  }

  /// Build the app on an explicit cache and fetcher.
  pub fn with_parts(
    config: &Config,
    cache: Arc<dyn PersistentCache>,
    fetcher: Arc<dyn Fetcher>,
  ) -> Result<Self> {
    let feed = FeedLoader::new(
      ResourceLoader::new(Arc::clone(&cache), Arc::clone(&fetcher)),
      config.feed.url.clone(),
    );
    let images = ResourceLoader::new(cache, fetcher);
    let placeholder = ImageBytes::decode(PLACEHOLDER_GIF)
      .map_err(|e| eyre!("Built-in placeholder is invalid: {}", e))?;

    Ok(Self {
      feed,
      images,
      placeholder,
    })
  }

  /// Print the names of records matching `search`.
  pub async fn list(&self, search: &str, out: &mut dyn Write) -> Result<()> {
    let records = self.load_feed(out).await?;
    for record in filter_records(&records, search) {
      writeln!(out, "{}", record.name)?;
    }
    Ok(())
  }

  /// Print one record's details and what its image resolved to.
  pub async fn show(&self, name: &str, out: &mut dyn Write) -> Result<()> {
    let records = self.load_feed(out).await?;
    let record = find_record(&records, name).ok_or_else(|| eyre!("No record named {:?}", name))?;

    writeln!(out, "{}", record.name)?;
    for line in detail_lines(record) {
      writeln!(out, "  {}", line)?;
    }

    let mut loader = self.image_loader(record)?;
    loader.load().await?;
    writeln!(out, "  Image: {}", describe_image(&loader))?;
    Ok(())
  }

  /// Load every matching row's image concurrently and report each one.
  pub async fn images(&self, search: &str, out: &mut dyn Write) -> Result<()> {
    let records = self.load_feed(out).await?;

    let mut rows = Vec::new();
    for record in filter_records(&records, search) {
      match self.image_loader(record) {
        Ok(mut loader) => {
          loader.start();
          rows.push((record, loader));
        }
        Err(e) => writeln!(out, "{}: {}", record.name, e)?,
      }
    }

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    while rows.iter().any(|(_, loader)| loader.is_loading()) {
      ticker.tick().await;
      for (_, loader) in rows.iter_mut() {
        loader.poll();
      }
    }

    for (record, loader) in &rows {
      writeln!(out, "{}: {}", record.name, describe_image(loader))?;
    }
    Ok(())
  }

  /// Load the feed once for this view and return the published records.
  async fn load_feed(&self, out: &mut dyn Write) -> Result<Arc<Vec<Record>>> {
    match self.feed.load().await? {
      LoadResult::Fresh(_) => {}
      LoadResult::Stale(_) => writeln!(out, "(offline: showing cached feed)")?,
      LoadResult::Unavailable => {
        info!(url = self.feed.url(), "feed unavailable");
        writeln!(out, "(feed unavailable)")?;
      }
    }
    Ok(self.feed.records())
  }

  fn image_loader(&self, record: &Record) -> Result<ImageLoader> {
    Ok(ImageLoader::new(
      self.images.clone(),
      record.image.clone(),
      self.placeholder.clone(),
    )?)
  }
}

fn describe_image(loader: &ImageLoader) -> String {
  let resolved = loader
    .outcome()
    .and_then(|result| Some((result.value()?, result.source_label())));

  match resolved {
    Some((image, source)) => format!(
      "{} {}x{} ({})",
      image.format, image.width, image.height, source
    ),
    None => "placeholder".to_string(),
  }
}

/// Open the process-wide cache selected by configuration.
pub fn open_cache(config: &CacheConfig) -> Result<Arc<dyn PersistentCache>> {
  let cache: Arc<dyn PersistentCache> = match config.mode {
    CacheMode::Sqlite => match &config.path {
      Some(path) => Arc::new(SqliteCache::open_at(path)?),
      None => Arc::new(SqliteCache::open()?),
    },
    CacheMode::Memory => Arc::new(MemoryCache::new()),
    CacheMode::Off => Arc::new(NoopCache),
  };
  info!(mode = ?config.mode, "cache opened");
  Ok(cache)
}
