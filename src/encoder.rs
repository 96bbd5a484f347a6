//! Variant generation for one input image under one policy.
//!
//! [`VariantEncoder::encode`] walks a policy's target widths in ascending
//! order and produces one [`Variant`] per surviving width. Failures are
//! captured as data (`Variant` with `Error` status), never raised: one
//! width's failure does not abort its siblings, and one unreadable source
//! poisons only that input's widths — all with the same underlying
//! message.
//!
//! The policy's output subdirectory (`{output_root}/{policy}`) is created
//! lazily before the first real write; dry runs never touch storage or
//! decode the source.

use crate::imaging::{
    Effort, IconParams, ImageBackend, Quality, StillParams, calculations::surviving_widths,
};
use crate::policy::{OutputKind, Policy};
use crate::types::{CancelFlag, EncodeOverrides, InputImage, Variant};
use std::path::Path;
use tracing::error;

pub struct VariantEncoder<'a, B: ImageBackend> {
    backend: &'a B,
}

impl<'a, B: ImageBackend> VariantEncoder<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Produce the ordered variant set for `image` under `policy`.
    ///
    /// The result is ordered by ascending target width regardless of how
    /// the underlying work completes. Once `cancel` is set, no further
    /// widths are dispatched.
    pub fn encode(
        &self,
        image: &InputImage,
        policy: &Policy,
        overrides: &EncodeOverrides,
        output_root: &Path,
        cancel: &CancelFlag,
    ) -> Vec<Variant> {
        let widths = surviving_widths(&policy.widths, overrides.width_cap);
        let ext = policy.output_kind.extension();
        let file_name = |w: u32| format!("{}-{}.{}", image.identity, w, ext);

        if overrides.dry_run {
            return widths
                .into_iter()
                .map(|w| Variant::dry_run(&image.identity, policy.name, w, file_name(w)))
                .collect();
        }

        // Probe the source up front so an unreadable input reports the
        // same message for every width instead of N decode attempts.
        if let Err(e) = self.backend.identify(&image.bytes) {
            let message = e.to_string();
            error!(identity = %image.identity, error = %message, "source unreadable");
            return widths
                .into_iter()
                .map(|w| {
                    Variant::error(
                        &image.identity,
                        policy.name,
                        w,
                        file_name(w),
                        message.clone(),
                    )
                })
                .collect();
        }

        let quality = Quality::new(overrides.quality.unwrap_or(policy.encode.quality));
        let effort = overrides
            .effort
            .or(policy.encode.effort)
            .map(Effort::new)
            .unwrap_or_default();

        let type_dir = output_root.join(policy.name.dir_name());
        let mut dir_ready = false;
        let mut variants = Vec::with_capacity(widths.len());

        for w in widths {
            if cancel.is_cancelled() {
                break;
            }
            let file = file_name(w);

            // Lazy subdirectory creation; a failure counts against this
            // width only and the next width retries.
            if !dir_ready {
                if let Err(e) = std::fs::create_dir_all(&type_dir) {
                    let message = format!("cannot create {}: {e}", type_dir.display());
                    error!(identity = %image.identity, width = w, error = %message, "storage failure");
                    variants.push(Variant::error(
                        &image.identity,
                        policy.name,
                        w,
                        file,
                        message,
                    ));
                    continue;
                }
                dir_ready = true;
            }

            let output = type_dir.join(&file);
            let result = match policy.output_kind {
                OutputKind::SingleImage => self.backend.still(
                    &image.bytes,
                    &StillParams {
                        output,
                        width: w,
                        quality,
                        effort,
                    },
                ),
                OutputKind::MultiResIconBundle => {
                    self.backend.icon(&image.bytes, &IconParams { output, size: w })
                }
            };

            variants.push(match result {
                Ok(size) => Variant::generated(&image.identity, policy.name, w, file, size),
                Err(e) => {
                    let message = e.to_string();
                    error!(identity = %image.identity, width = w, error = %message, "variant failed");
                    Variant::error(&image.identity, policy.name, w, file, message)
                }
            });
        }

        variants
    }
}
