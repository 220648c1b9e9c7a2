//! Cached catalog client for the Star Wars cats feed.
//!
//! Both the feed and its images go through one [`cache::ResourceLoader`]
//! abstraction: network first, write-through on success, fall back to the
//! persisted copy on failure.

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod image;
pub mod logging;
pub mod query;
