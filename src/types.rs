//! Shared types used across the pipeline.
//!
//! Everything the reporting layer consumes (variants, summaries) is
//! serde-serializable so a CLI and a JSON transport can share the same
//! result structures.

use crate::policy::PolicyName;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One source image entering the pipeline.
///
/// The ingestion layer (CLI scan, upload handler) owns producing these;
/// it must give each input a storage-distinct `identity` (basename without
/// directory or extension) before handing it to the core.
#[derive(Debug, Clone)]
pub struct InputImage {
    /// Basename without directory or extension, e.g. `banner_hero`.
    pub identity: String,
    /// Raw source bytes. Decoded once per input.
    pub bytes: Vec<u8>,
    /// Policy supplied by the caller. Skips filename inference entirely.
    pub explicit_policy: Option<PolicyName>,
}

/// Outcome of one (input, width) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariantStatus {
    Generated,
    DryRun,
    Error,
}

/// One generated (or simulated) output file for one input at one target
/// width under one policy. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub identity: String,
    pub policy: PolicyName,
    pub target_width: u32,
    /// Output filename, `{identity}-{width}.{ext}`. Always encodes the
    /// nominal target width, even when the encode was clamped to the
    /// source's native width.
    pub file: String,
    pub status: VariantStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Variant {
    pub fn generated(
        identity: &str,
        policy: PolicyName,
        target_width: u32,
        file: String,
        size: u64,
    ) -> Self {
        Self {
            identity: identity.to_string(),
            policy,
            target_width,
            file,
            status: VariantStatus::Generated,
            size: Some(size),
            error: None,
        }
    }

    pub fn dry_run(identity: &str, policy: PolicyName, target_width: u32, file: String) -> Self {
        Self {
            identity: identity.to_string(),
            policy,
            target_width,
            file,
            status: VariantStatus::DryRun,
            size: None,
            error: None,
        }
    }

    pub fn error(
        identity: &str,
        policy: PolicyName,
        target_width: u32,
        file: String,
        message: String,
    ) -> Self {
        Self {
            identity: identity.to_string(),
            policy,
            target_width,
            file,
            status: VariantStatus::Error,
            size: None,
            error: Some(message),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == VariantStatus::Error
    }
}

/// Process-wide options applied to every input in a batch.
#[derive(Debug, Clone, Default)]
pub struct EncodeOverrides {
    /// Overrides the policy's encode quality for every width.
    pub quality: Option<u32>,
    /// Overrides the policy's encode effort for every width.
    pub effort: Option<u32>,
    /// Widths above this value are skipped entirely (no variant emitted).
    pub width_cap: Option<u32>,
    /// Simulate: emit `DryRun` variants, never touch storage or decode.
    pub dry_run: bool,
}

impl EncodeOverrides {
    /// Build overrides from free-form strings as supplied by a CLI flag or
    /// form field. Values are truncated to integers; unparseable values
    /// fall back to the policy default rather than aborting the batch.
    pub fn from_raw(
        quality: Option<&str>,
        effort: Option<&str>,
        width_cap: Option<&str>,
        dry_run: bool,
    ) -> Self {
        Self {
            quality: quality.and_then(coerce_int),
            effort: effort.and_then(coerce_int),
            width_cap: width_cap.and_then(coerce_int),
            dry_run,
        }
    }
}

/// Truncate a numeric string to a non-negative integer. `"55.7"` → 55.
fn coerce_int(raw: &str) -> Option<u32> {
    let value = raw.trim().parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value.trunc() as u32)
    } else {
        None
    }
}

/// Cooperative cancellation flag shared between a batch and its owner.
///
/// Once set, no further widths are dispatched; in-flight encodes are
/// allowed to complete (cheap, bounded work).
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
