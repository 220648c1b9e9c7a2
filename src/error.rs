//! Error types for resource loading.
//!
//! Only [`InvalidKey`] ever reaches a caller of `ResourceLoader::load`. The
//! other errors are absorbed by the loader and only decide which
//! `LoadResult` variant comes back.

use thiserror::Error;

/// A source identifier that cannot be loaded at all.
///
/// Raised before any network or cache I/O happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid source id {source_id:?}: {reason}")]
pub struct InvalidKey {
  pub source_id: String,
  pub reason: &'static str,
}

impl InvalidKey {
  pub fn new(source_id: impl Into<String>, reason: &'static str) -> Self {
    Self {
      source_id: source_id.into(),
      reason,
    }
  }
}

/// Network-side failure while fetching a resource.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("request to {url} failed: {source}")]
  Transport {
    url: String,
    #[source]
    source: reqwest::Error,
  },
  #[error("{url} responded with status {status}")]
  Status { url: String, status: u16 },
  /// Connection refused, DNS failure or timeout.
  #[error("{url} is unreachable: {source}")]
  Unreachable {
    url: String,
    #[source]
    source: reqwest::Error,
  },
}

/// Bytes were fetched (or read from the cache) but are not a valid value.
#[derive(Debug, Error)]
pub enum DecodeError {
  #[error("payload is empty")]
  Empty,
  #[error("malformed feed document: {0}")]
  Json(#[from] serde_json::Error),
  #[error("unrecognized image format")]
  UnknownImageFormat,
  #[error("{format} header is truncated or corrupt")]
  CorruptImage { format: &'static str },
  #[error("{format} image does not decode: {source}")]
  Undecodable {
    format: &'static str,
    #[source]
    source: ::image::ImageError,
  },
}

/// Everything that can go wrong inside a single load attempt.
///
/// `CacheMiss` and the fallback errors never leave the loader.
#[derive(Debug, Error)]
pub(crate) enum ResourceError {
  #[error(transparent)]
  Fetch(#[from] FetchError),
  #[error(transparent)]
  Decode(#[from] DecodeError),
  #[error("no cached copy")]
  CacheMiss,
  #[error("cache storage failed: {0}")]
  Storage(String),
}
