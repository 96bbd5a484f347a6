//! Image processing — pure Rust, zero external dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | full decode via the `image` crate |
//! | **Resize → AVIF** | Lanczos3 + rav1e encoder |
//! | **Icon bundle** | transparent square canvas + ICO encoder |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use params::{DEFAULT_EFFORT, Effort, IconParams, Quality, StillParams};
pub use rust_backend::RustBackend;
