use tracing::{debug, warn};

use super::format::{decode_raster, ImageFormat};
use crate::cache::{LoadResult, Resource, ResourceLoader};
use crate::error::{DecodeError, InvalidKey};
use crate::query::{Query, QueryState};

/// 1x1 transparent GIF, the stock placeholder for rows without a picture yet
pub const PLACEHOLDER_GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00\xff\xff\xff\x00\x00\x00!\xf9\x04\x01\x00\x00\x00\x00,\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02D\x01\x00;";

/// Encoded image bytes that decoded cleanly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBytes {
  pub data: Vec<u8>,
  pub format: ImageFormat,
  pub width: u32,
  pub height: u32,
}

impl Resource for ImageBytes {
  fn namespace() -> &'static str {
    "cat_image"
  }

  fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
    if bytes.is_empty() {
      return Err(DecodeError::Empty);
    }
    let (format, width, height) = decode_raster(bytes)?;
    Ok(Self {
      data: bytes.to_vec(),
      format,
      width,
      height,
    })
  }
}

/// Loads one image for one row, showing a placeholder until it resolves.
///
/// Instances are not shared: two rows with the same URL load it twice.
pub struct ImageLoader {
  url: String,
  placeholder: ImageBytes,
  resources: ResourceLoader<ImageBytes>,
  query: Query<LoadResult<ImageBytes>>,
  outcome: Option<LoadResult<ImageBytes>>,
}

impl ImageLoader {
  /// Create a loader for `url`. The URL is checked here, before any I/O.
  pub fn new(
    resources: ResourceLoader<ImageBytes>,
    url: impl Into<String>,
    placeholder: ImageBytes,
  ) -> Result<Self, InvalidKey> {
    let url = url.into();
    ResourceLoader::<ImageBytes>::validate(&url)?;

    let query = {
      let resources = resources.clone();
      let url = url.clone();
      Query::new(move || {
        let resources = resources.clone();
        let url = url.clone();
        async move { resources.load(&url).await.map_err(|e| e.to_string()) }
      })
    };

    Ok(Self {
      url,
      placeholder,
      resources,
      query,
      outcome: None,
    })
  }

  pub fn url(&self) -> &str {
    &self.url
  }

  /// The loaded image, or the placeholder while loading or when unavailable.
  pub fn image(&self) -> &ImageBytes {
    self
      .outcome
      .as_ref()
      .and_then(LoadResult::value)
      .unwrap_or(&self.placeholder)
  }

  pub fn is_placeholder(&self) -> bool {
    self.outcome.as_ref().and_then(LoadResult::value).is_none()
  }

  /// How the last load resolved, once it has.
  pub fn outcome(&self) -> Option<&LoadResult<ImageBytes>> {
    self.outcome.as_ref()
  }

  pub fn is_loading(&self) -> bool {
    self.query.is_loading()
  }

  /// Load in place and return what should be displayed.
  pub async fn load(&mut self) -> Result<&ImageBytes, InvalidKey> {
    let result = self.resources.load(&self.url).await?;
    self.resolve(result);
    Ok(self.image())
  }

  /// Start loading on a background task. Pick the result up with `poll`.
  pub fn start(&mut self) {
    self.query.fetch();
  }

  /// Apply a finished background load. Returns `true` if the displayed
  /// image may have changed.
  pub fn poll(&mut self) -> bool {
    if !self.query.poll() {
      return false;
    }
    self.take_query_outcome();
    true
  }

  /// Wait for a background load started with `start`.
  pub async fn settle(&mut self) {
    self.query.settle().await;
    self.take_query_outcome();
  }

  fn take_query_outcome(&mut self) {
    let result = match self.query.state() {
      QueryState::Success(result) => result.clone(),
      QueryState::Error(e) => {
        warn!(url = %self.url, error = %e, "image load task failed");
        return;
      }
      QueryState::Idle | QueryState::Loading => return,
    };
    self.resolve(result);
  }

  fn resolve(&mut self, result: LoadResult<ImageBytes>) {
    debug!(url = %self.url, source = result.source_label(), "image resolved");
    self.outcome = Some(result);
  }
}
