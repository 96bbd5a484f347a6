//! Shared test utilities for the imgpipe test suite.
//!
//! Synthetic source images are generated in-memory through the `image`
//! crate, so tests never depend on fixture files or external tooling.

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Opaque gradient PNG of the given dimensions, returned as encoded bytes.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}
