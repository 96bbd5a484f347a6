//! Pure Rust image processing backend — zero external dependencies.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Orientation | `ImageDecoder::orientation` + `apply_orientation` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e) |
//! | Icon canvas | `RgbaImage` + `image::imageops::overlay` |
//! | Encode → ICO | `image::codecs::ico::IcoEncoder` (PNG entries) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{
    centered_offset, clamped_target_width, contain_dimensions, scaled_height,
};
use super::params::{IconParams, StillParams};
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Extensions whose decoders are compiled in and known to work.
///
/// AVIF is an output endpoint only: the `image` crate's `"avif"` feature
/// enables the rav1e **encoder**, while decoding would need the C-backed
/// `"avif-native"` feature we deliberately avoid.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

/// Returns the set of image file extensions that have working decoders
/// compiled in.
pub fn supported_input_extensions() -> impl Iterator<Item = &'static str> {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
}

/// ICO directory entries store dimensions in a single byte; 256 is the
/// format's hard ceiling.
const ICO_MAX_EDGE: u32 = 256;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode source bytes and normalize orientation, applying any embedded
/// rotation metadata before the image is measured or resized.
fn decode_oriented(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(BackendError::Io)?;
    let mut decoder = reader
        .into_decoder()
        .map_err(|e| BackendError::Decode(e.to_string()))?;
    let orientation = decoder
        .orientation()
        .unwrap_or(Orientation::NoTransforms);
    let mut img =
        DynamicImage::from_decoder(decoder).map_err(|e| BackendError::Decode(e.to_string()))?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Encode and save as AVIF, returning the written size in bytes.
fn save_avif(img: &DynamicImage, path: &Path, speed: u8, quality: u8) -> Result<u64, BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(writer, speed, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(format!("AVIF encode failed: {e}")))?;
    written_size(path)
}

fn written_size(path: &Path) -> Result<u64, BackendError> {
    Ok(std::fs::metadata(path).map_err(BackendError::Io)?.len())
}

/// Downscale to the target width, never enlarging. `resize_exact` pins
/// the width; only the height is rounded. Plain `resize` would re-derive
/// the ratio from the rounded height and can undershoot the width by a
/// pixel or two on wide aspect ratios.
fn resize_for_width(img: DynamicImage, nominal_width: u32) -> DynamicImage {
    let target = clamped_target_width(img.width(), nominal_width);
    if target < img.width() {
        let height = scaled_height((img.width(), img.height()), target);
        img.resize_exact(target, height, FilterType::Lanczos3)
    } else {
        img
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        // A full decode is deliberate: it surfaces the same error message a
        // corrupt source would produce on every subsequent operation.
        let img = decode_oriented(bytes)?;
        Ok(Dimensions {
            width: img.width(),
            height: img.height(),
        })
    }

    fn still(&self, bytes: &[u8], params: &StillParams) -> Result<u64, BackendError> {
        let img = decode_oriented(bytes)?;
        let resized = resize_for_width(img, params.width);
        save_avif(
            &resized,
            &params.output,
            params.effort.speed(),
            params.quality.value() as u8,
        )
    }

    fn icon(&self, bytes: &[u8], params: &IconParams) -> Result<u64, BackendError> {
        if params.size > ICO_MAX_EDGE {
            return Err(BackendError::Encode(format!(
                "ICO container supports at most {ICO_MAX_EDGE}px, got {}",
                params.size
            )));
        }
        let img = decode_oriented(bytes)?;

        // Contain-fit onto a fully transparent square canvas: non-square
        // sources are letterboxed, never cropped.
        let (fit_w, fit_h) = contain_dimensions((img.width(), img.height()), params.size);
        let fitted = img
            .resize_exact(fit_w, fit_h, FilterType::Lanczos3)
            .to_rgba8();
        let mut canvas = RgbaImage::from_pixel(params.size, params.size, Rgba([0, 0, 0, 0]));
        let (x, y) = centered_offset((fit_w, fit_h), params.size);
        image::imageops::overlay(&mut canvas, &fitted, x, y);

        let file = std::fs::File::create(&params.output).map_err(BackendError::Io)?;
        let writer = std::io::BufWriter::new(file);
        let encoder = image::codecs::ico::IcoEncoder::new(writer);
        DynamicImage::ImageRgba8(canvas)
            .write_with_encoder(encoder)
            .map_err(|e| BackendError::Encode(format!("ICO encode failed: {e}")))?;
        written_size(&params.output)
    }
}
