//! Remote images: header validation and per-row loading.

mod format;
mod loader;

pub use format::ImageFormat;
pub use loader::{ImageBytes, ImageLoader, PLACEHOLDER_GIF};
