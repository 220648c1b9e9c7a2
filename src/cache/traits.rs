//! Core traits and types for the caching system.

use crate::error::DecodeError;

/// A value that can be fetched as raw bytes, decoded, and cached.
///
/// Implementors pick a namespace that keeps their cache keys apart from every
/// other resource kind sharing the same store.
pub trait Resource: Sized + Send + 'static {
  /// Key prefix for this resource kind (e.g., "cat_image")
  fn namespace() -> &'static str;

  /// Decode raw bytes, as fetched or as cached, into a value.
  fn decode(bytes: &[u8]) -> Result<Self, DecodeError>;

  /// Cache key for a source id: `<namespace>_<source_id>`.
  fn cache_key(source_id: &str) -> String {
    format!("{}_{}", Self::namespace(), source_id)
  }
}

/// Outcome of a load, tagged with where the value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadResult<T> {
  /// Fetched from the network and written through to the cache
  Fresh(T),
  /// Network failed or returned garbage; served from the cache
  Stale(T),
  /// Neither the network nor the cache produced a value
  Unavailable,
}

impl<T> LoadResult<T> {
  pub fn is_fresh(&self) -> bool {
    matches!(self, LoadResult::Fresh(_))
  }

  pub fn is_stale(&self) -> bool {
    matches!(self, LoadResult::Stale(_))
  }

  pub fn is_unavailable(&self) -> bool {
    matches!(self, LoadResult::Unavailable)
  }

  pub fn value(&self) -> Option<&T> {
    match self {
      LoadResult::Fresh(value) | LoadResult::Stale(value) => Some(value),
      LoadResult::Unavailable => None,
    }
  }

  pub fn into_value(self) -> Option<T> {
    match self {
      LoadResult::Fresh(value) | LoadResult::Stale(value) => Some(value),
      LoadResult::Unavailable => None,
    }
  }

  /// Short label for status lines and logs.
  pub fn source_label(&self) -> &'static str {
    match self {
      LoadResult::Fresh(_) => "network",
      LoadResult::Stale(_) => "cache",
      LoadResult::Unavailable => "unavailable",
    }
  }
}
