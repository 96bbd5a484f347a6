//! Batch orchestration: drive the encoder across a collection of inputs.
//!
//! Inputs are processed on rayon worker threads — each input's filesystem
//! writes are confined to its own policy subdirectory, so there is no
//! shared mutable state beyond the read-only policy catalog — but the
//! result sequence always preserves the supplied input order.
//!
//! One input's total failure (unreadable bytes, every width erroring)
//! never prevents subsequent inputs from being processed. The only hard
//! precondition is a non-empty input set.

use crate::encoder::VariantEncoder;
use crate::imaging::ImageBackend;
use crate::policy::{PolicyCatalog, PolicyName};
use crate::types::{CancelFlag, EncodeOverrides, InputImage, Variant};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("no input images supplied")]
    NoInputs,
}

/// Aggregate counters for one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total_inputs: usize,
    /// Variants that are not errors; dry-run variants count here too.
    pub total_variants_generated: usize,
    /// Inputs that produced at least one error variant.
    pub inputs_with_errors: usize,
}

/// All variants for one input, in ascending-width order.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub identity: String,
    pub policy: PolicyName,
    pub variants: Vec<Variant>,
}

/// Everything the reporting layer needs from one batch invocation.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub files: Vec<FileResult>,
    pub summary: BatchSummary,
}

/// Progress notifications emitted while a batch runs. Drained by a
/// printer thread on the CLI; ignored when no sender is supplied.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    FileStarted {
        identity: String,
        policy: PolicyName,
    },
    FileFinished {
        identity: String,
        policy: PolicyName,
        generated: usize,
        errors: usize,
    },
}

pub struct BatchRunner<'a, B: ImageBackend> {
    catalog: &'a PolicyCatalog,
    backend: &'a B,
}

impl<'a, B: ImageBackend> BatchRunner<'a, B> {
    pub fn new(catalog: &'a PolicyCatalog, backend: &'a B) -> Self {
        Self { catalog, backend }
    }

    /// Process every input in supplied order, writing variants beneath
    /// `output_root` and aggregating a summary.
    pub fn run(
        &self,
        images: &[InputImage],
        output_root: &Path,
        overrides: &EncodeOverrides,
        events: Option<Sender<BatchEvent>>,
        cancel: &CancelFlag,
    ) -> Result<BatchResult, BatchError> {
        if images.is_empty() {
            return Err(BatchError::NoInputs);
        }

        let encoder = VariantEncoder::new(self.backend);

        // par_iter preserves input order in the collected output even
        // though completion order is arbitrary.
        let files: Vec<FileResult> = images
            .par_iter()
            .map_with(events, |tx, image| {
                let policy_name = self
                    .catalog
                    .resolve(&image.identity, image.explicit_policy);
                if let Some(tx) = tx {
                    let _ = tx.send(BatchEvent::FileStarted {
                        identity: image.identity.clone(),
                        policy: policy_name,
                    });
                }

                let policy = self.catalog.get(policy_name);
                let variants = encoder.encode(image, policy, overrides, output_root, cancel);

                if let Some(tx) = tx {
                    let errors = variants.iter().filter(|v| v.is_error()).count();
                    let _ = tx.send(BatchEvent::FileFinished {
                        identity: image.identity.clone(),
                        policy: policy_name,
                        generated: variants.len() - errors,
                        errors,
                    });
                }

                FileResult {
                    identity: image.identity.clone(),
                    policy: policy_name,
                    variants,
                }
            })
            .collect();

        let summary = summarize(&files);
        Ok(BatchResult { files, summary })
    }
}

fn summarize(files: &[FileResult]) -> BatchSummary {
    BatchSummary {
        total_inputs: files.len(),
        total_variants_generated: files
            .iter()
            .flat_map(|f| &f.variants)
            .filter(|v| !v.is_error())
            .count(),
        inputs_with_errors: files
            .iter()
            .filter(|f| f.variants.iter().any(Variant::is_error))
            .count(),
    }
}
