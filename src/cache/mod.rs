//! Generic read-through caching for remote resources.
//!
//! This module provides a resource-agnostic loader that:
//! - Fetches from the network first, every time
//! - Writes successful payloads through to a persistent key/value store
//! - Falls back to the stored copy when the network fails or returns garbage
//! - Namespaces keys per resource kind so one store can back every loader

mod layer;
mod storage;
mod traits;

pub use layer::ResourceLoader;
pub use storage::{MemoryCache, NoopCache, PersistentCache, SqliteCache};
pub use traits::{LoadResult, Resource};
