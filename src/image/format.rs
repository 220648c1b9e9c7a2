//! Raster format detection and validation.
//!
//! [`probe`] only reads the header: the signature picks the format and the
//! format's header yields the pixel dimensions. [`decode_raster`] then runs
//! the full decoder so truncated or corrupt pixel data is rejected too.

use crate::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
  Png,
  Jpeg,
  Gif,
  WebP,
  Bmp,
}

impl ImageFormat {
  pub fn name(self) -> &'static str {
    match self {
      ImageFormat::Png => "PNG",
      ImageFormat::Jpeg => "JPEG",
      ImageFormat::Gif => "GIF",
      ImageFormat::WebP => "WebP",
      ImageFormat::Bmp => "BMP",
    }
  }

  fn raster(self) -> ::image::ImageFormat {
    match self {
      ImageFormat::Png => ::image::ImageFormat::Png,
      ImageFormat::Jpeg => ::image::ImageFormat::Jpeg,
      ImageFormat::Gif => ::image::ImageFormat::Gif,
      ImageFormat::WebP => ::image::ImageFormat::WebP,
      ImageFormat::Bmp => ::image::ImageFormat::Bmp,
    }
  }

  /// Detect the format from magic bytes.
  pub fn detect(data: &[u8]) -> Option<Self> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
      Some(ImageFormat::Png)
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
      Some(ImageFormat::Jpeg)
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
      Some(ImageFormat::Gif)
    } else if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
      Some(ImageFormat::WebP)
    } else if data.starts_with(b"BM") {
      Some(ImageFormat::Bmp)
    } else {
      None
    }
  }
}

impl std::fmt::Display for ImageFormat {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// Detect the format and read `(width, height)` from the header.
pub fn probe(data: &[u8]) -> Result<(ImageFormat, u32, u32), DecodeError> {
  let format = ImageFormat::detect(data).ok_or(DecodeError::UnknownImageFormat)?;
  let dimensions = match format {
    ImageFormat::Png => png_dimensions(data),
    ImageFormat::Jpeg => jpeg_dimensions(data),
    ImageFormat::Gif => gif_dimensions(data),
    ImageFormat::WebP => webp_dimensions(data),
    ImageFormat::Bmp => bmp_dimensions(data),
  };

  match dimensions {
    Some((width, height)) if width > 0 && height > 0 => Ok((format, width, height)),
    _ => Err(DecodeError::CorruptImage {
      format: format.name(),
    }),
  }
}

/// Probe the header, then decode every pixel.
///
/// Returns the same `(format, width, height)` as [`probe`]; the dimensions
/// come from the decoded image.
pub fn decode_raster(data: &[u8]) -> Result<(ImageFormat, u32, u32), DecodeError> {
  let (format, _, _) = probe(data)?;
  let decoded = ::image::load_from_memory_with_format(data, format.raster()).map_err(|source| {
    DecodeError::Undecodable {
      format: format.name(),
      source,
    }
  })?;
  Ok((format, decoded.width(), decoded.height()))
}

fn be_u16(data: &[u8], at: usize) -> Option<u32> {
  let b = data.get(at..at + 2)?;
  Some(u32::from(u16::from_be_bytes([b[0], b[1]])))
}

fn le_u16(data: &[u8], at: usize) -> Option<u32> {
  let b = data.get(at..at + 2)?;
  Some(u32::from(u16::from_le_bytes([b[0], b[1]])))
}

fn be_u32(data: &[u8], at: usize) -> Option<u32> {
  let b = data.get(at..at + 4)?;
  Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn le_u32(data: &[u8], at: usize) -> Option<u32> {
  let b = data.get(at..at + 4)?;
  Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn le_u24(data: &[u8], at: usize) -> Option<u32> {
  let b = data.get(at..at + 3)?;
  Some(u32::from_le_bytes([b[0], b[1], b[2], 0]))
}

/// IHDR must be the first chunk.
fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
  if data.get(12..16)? != b"IHDR" {
    return None;
  }
  Some((be_u32(data, 16)?, be_u32(data, 20)?))
}

fn gif_dimensions(data: &[u8]) -> Option<(u32, u32)> {
  Some((le_u16(data, 6)?, le_u16(data, 8)?))
}

/// Negative heights mean top-down rows.
fn bmp_dimensions(data: &[u8]) -> Option<(u32, u32)> {
  let width = le_u32(data, 18)? as i32;
  let height = le_u32(data, 22)? as i32;
  Some((width.unsigned_abs(), height.unsigned_abs()))
}

fn webp_dimensions(data: &[u8]) -> Option<(u32, u32)> {
  match data.get(12..16)? {
    b"VP8 " => {
      // Key frame start code follows the 3-byte frame tag
      if data.get(23..26)? != [0x9D, 0x01, 0x2A] {
        return None;
      }
      Some((le_u16(data, 26)? & 0x3FFF, le_u16(data, 28)? & 0x3FFF))
    }
    b"VP8L" => {
      if *data.get(20)? != 0x2F {
        return None;
      }
      let bits = le_u32(data, 21)?;
      Some(((bits & 0x3FFF) + 1, ((bits >> 14) & 0x3FFF) + 1))
    }
    b"VP8X" => Some((le_u24(data, 24)? + 1, le_u24(data, 27)? + 1)),
    _ => None,
  }
}

/// Walk the marker segments up to the first start-of-frame.
fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
  let mut i = 2;
  loop {
    if *data.get(i)? != 0xFF {
      return None;
    }
    // Fill bytes
    while *data.get(i + 1)? == 0xFF {
      i += 1;
    }
    let marker = *data.get(i + 1)?;
    match marker {
      // Standalone markers carry no length
      0x01 | 0xD0..=0xD7 => i += 2,
      // Start of scan before any frame header
      0xDA | 0xD9 => return None,
      0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
        return Some((be_u16(data, i + 7)?, be_u16(data, i + 5)?));
      }
      _ => {
        let len = be_u16(data, i + 2)? as usize;
        if len < 2 {
          return None;
        }
        i += 2 + len;
      }
    }
  }
}
