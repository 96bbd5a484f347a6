//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend
//! must support: identify, still, and icon.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) — pure Rust, zero
//! external dependencies. Everything is statically linked into the binary.

use super::params::{IconParams, StillParams};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Backends are handed the raw source bytes for every operation rather
/// than a decoded image, so a failed decode surfaces as an error on each
/// operation with the same underlying message. `Sync` is required because
/// batch inputs are processed on rayon worker threads.
pub trait ImageBackend: Sync {
    /// Decode enough of the source to report its native dimensions.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Resize (never enlarging) and encode one still-image variant.
    /// Returns the written output size in bytes.
    fn still(&self, bytes: &[u8], params: &StillParams) -> Result<u64, BackendError>;

    /// Letterbox onto a transparent square canvas and package one
    /// icon-container variant. Returns the written output size in bytes.
    fn icon(&self, bytes: &[u8], params: &IconParams) -> Result<u64, BackendError>;
}
