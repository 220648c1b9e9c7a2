//! The catalog feed: records, loading, and list helpers.

mod catalog;
mod loader;
mod types;

pub use catalog::{detail_lines, filter_records, find_record, Field, DETAIL_FIELDS};
pub use loader::FeedLoader;
pub use types::{FeedDocument, Record};
