//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`encoder`](crate::encoder) (which decides what
//! variants to create) and the [`backend`](super::backend) (which does the
//! actual pixel work). This separation allows swapping backends (e.g. for
//! testing with a mock) without changing encoder logic.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(50)
    }
}

/// Encoder effort (0-9): higher is slower and smaller, matching the
/// convention of the AVIF tooling this pipeline replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effort(u32);

/// Effort applied when neither the policy nor the caller sets one.
pub const DEFAULT_EFFORT: u32 = 4;

impl Effort {
    pub fn new(value: u32) -> Self {
        Self(value.min(9))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// rav1e speed equivalent: speed runs 1-10 with higher = faster, so
    /// effort inverts onto it. The default effort 4 lands on speed 6.
    pub fn speed(self) -> u8 {
        (10 - self.0) as u8
    }
}

impl Default for Effort {
    fn default() -> Self {
        Self(DEFAULT_EFFORT)
    }
}

/// Full specification for one still-image variant: resize to the target
/// width (never enlarging) and encode to AVIF at the output path.
#[derive(Debug, Clone, PartialEq)]
pub struct StillParams {
    pub output: PathBuf,
    /// Nominal target width. The backend clamps to the source's native
    /// width; the output path already encodes the nominal value.
    pub width: u32,
    pub quality: Quality,
    pub effort: Effort,
}

/// Full specification for one icon-bundle variant: letterbox the source
/// onto a transparent square canvas and package as an ICO container.
#[derive(Debug, Clone, PartialEq)]
pub struct IconParams {
    pub output: PathBuf,
    /// Square canvas edge length.
    pub size: u32,
}
