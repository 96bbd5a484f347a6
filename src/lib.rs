//! # imgpipe
//!
//! Batch image variant generator: source rasters go in, policy-driven
//! sets of responsive AVIF variants (or multi-resolution icon bundles)
//! come out, grouped per run under a short-lived session namespace with
//! a single downloadable archive.
//!
//! # Architecture: Policy → Encode → Session
//!
//! ```text
//! 1. Resolve   identity → policy       (explicit override or filename hints)
//! 2. Encode    policy widths → variants (resize + AVIF/ICO, per-width isolation)
//! 3. Session   variants → namespace     (archive packaging + timed expiry)
//! ```
//!
//! The same [`batch::BatchRunner`] drives a one-shot CLI run and a
//! session-backed upload request; only the ingestion and reporting
//! layers differ.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`policy`] | Static policy catalog + first-match-wins filename resolution |
//! | [`imaging`] | Pure-Rust image operations behind the [`imaging::ImageBackend`] seam |
//! | [`encoder`] | Per-input variant generation with per-width error isolation |
//! | [`batch`] | Order-preserving parallel batch orchestration and summaries |
//! | [`session`] | Ephemeral output namespaces, archive packaging, timed expiry |
//! | [`output`] | CLI output formatting — pure `format_*` functions |
//! | [`types`] | Shared pipeline types (`InputImage`, `Variant`, overrides) |
//!
//! # Design Decisions
//!
//! ## AVIF-Only Still Output
//!
//! All still-image variants are AVIF. The format has had [100% browser
//! support since September 2023](https://caniuse.com/avif) and produces
//! dramatically smaller files than JPEG at equivalent quality. The one
//! exception is the ICON policy, whose per-width outputs are ICO
//! containers because favicons and platform integrations demand them.
//!
//! ## Failures Are Data
//!
//! A corrupt source or a failed encode never aborts sibling work. Each
//! (input, width) pair reports its own [`types::Variant`] with a
//! `Generated`, `DryRun`, or `Error` status, and batch summaries carry
//! the error count instead of the process carrying a non-zero exit.
//!
//! ## Pure-Rust Imaging (No ImageMagick, No FFmpeg)
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling,
//! rav1e AVIF encoding, ICO packaging) — all pure Rust. This eliminates
//! system dependencies entirely: no `apt install`, no version conflicts.
//! The binary is fully self-contained.
//!
//! ## Sessions Are Ephemeral By Design
//!
//! A session namespace exists to hand results back across a
//! request/response boundary, not to store them. Ten minutes after
//! creation the whole tree is deleted unconditionally, whether or not
//! anyone downloaded it. Readers racing that deletion get not-found;
//! that race is accepted rather than locked away.

pub mod batch;
pub mod encoder;
pub mod imaging;
pub mod output;
pub mod policy;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
