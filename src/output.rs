//! CLI output formatting for batch runs.
//!
//! Each concern has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.
//!
//! ```text
//! banner_hero [HERO]
//!     400px: generated (12.4 KB)
//!     720px: generated (28.1 KB)
//! Done
//!     Files processed:   3
//!     Variants generated: 13
//!     Errors:            1
//! ```

use crate::batch::{BatchEvent, BatchSummary, FileResult};
use crate::types::VariantStatus;

/// Human-friendly byte count, one decimal place above 1 KB.
fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

/// Per-file block: identity header plus one indented line per variant.
pub fn format_file_result(file: &FileResult) -> Vec<String> {
    let mut lines = vec![format!("{} [{}]", file.identity, file.policy)];
    for v in &file.variants {
        let detail = match v.status {
            VariantStatus::Generated => {
                format!("generated ({})", format_size(v.size.unwrap_or(0)))
            }
            VariantStatus::DryRun => "dry-run".to_string(),
            VariantStatus::Error => {
                format!("error: {}", v.error.as_deref().unwrap_or("unknown"))
            }
        };
        lines.push(format!("    {}px: {}", v.target_width, detail));
    }
    lines
}

/// Progress line for one batch event, printed as files start and finish.
pub fn format_event(event: &BatchEvent) -> String {
    match event {
        BatchEvent::FileStarted { identity, policy } => {
            format!("==> {identity} [{policy}]")
        }
        BatchEvent::FileFinished {
            identity,
            generated,
            errors,
            ..
        } => {
            if *errors > 0 {
                format!("    {identity}: {generated} variants, {errors} errors")
            } else {
                format!("    {identity}: {generated} variants")
            }
        }
    }
}

/// Detail blocks for files that had failures, so every width's error
/// message reaches the user. Empty when the run was clean.
pub fn format_error_report(files: &[FileResult]) -> Vec<String> {
    let mut lines = Vec::new();
    for file in files {
        if file.variants.iter().any(|v| v.status == VariantStatus::Error) {
            lines.extend(format_file_result(file));
        }
    }
    lines
}

/// End-of-run summary block.
pub fn format_summary(summary: &BatchSummary) -> Vec<String> {
    vec![
        "Done".to_string(),
        format!("    Files processed:    {}", summary.total_inputs),
        format!("    Variants generated: {}", summary.total_variants_generated),
        format!("    Errors:             {}", summary.inputs_with_errors),
    ]
}

pub fn print_error_report(files: &[FileResult]) {
    for line in format_error_report(files) {
        println!("{line}");
    }
}

pub fn print_summary(summary: &BatchSummary) {
    for line in format_summary(summary) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyName;
    use crate::types::Variant;

    #[test]
    fn sizes_scale_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(12_698), "12.4 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn file_block_lists_each_variant() {
        let file = FileResult {
            identity: "banner_hero".into(),
            policy: PolicyName::Hero,
            variants: vec![
                Variant::generated("banner_hero", PolicyName::Hero, 400, "banner_hero-400.avif".into(), 2048),
                Variant::error(
                    "banner_hero",
                    PolicyName::Hero,
                    720,
                    "banner_hero-720.avif".into(),
                    "encode failed".into(),
                ),
            ],
        };

        let lines = format_file_result(&file);
        assert_eq!(lines[0], "banner_hero [HERO]");
        assert_eq!(lines[1], "    400px: generated (2.0 KB)");
        assert_eq!(lines[2], "    720px: error: encode failed");
    }

    #[test]
    fn dry_run_variants_say_so() {
        let file = FileResult {
            identity: "app_icon".into(),
            policy: PolicyName::Icon,
            variants: vec![Variant::dry_run(
                "app_icon",
                PolicyName::Icon,
                16,
                "app_icon-16.ico".into(),
            )],
        };
        assert_eq!(format_file_result(&file)[1], "    16px: dry-run");
    }

    #[test]
    fn error_report_lists_only_failed_files_with_messages() {
        let clean = FileResult {
            identity: "ok_card".into(),
            policy: PolicyName::Card,
            variants: vec![Variant::generated(
                "ok_card",
                PolicyName::Card,
                320,
                "ok_card-320.avif".into(),
                100,
            )],
        };
        let failed = FileResult {
            identity: "bad_card".into(),
            policy: PolicyName::Card,
            variants: vec![Variant::error(
                "bad_card",
                PolicyName::Card,
                320,
                "bad_card-320.avif".into(),
                "decode failed: bad header".into(),
            )],
        };

        let lines = format_error_report(&[clean, failed]);
        assert_eq!(lines[0], "bad_card [CARD]");
        assert!(lines[1].contains("decode failed: bad header"));
        assert!(!lines.iter().any(|l| l.contains("ok_card")));
    }

    #[test]
    fn error_report_is_empty_for_clean_runs() {
        let clean = FileResult {
            identity: "photo".into(),
            policy: PolicyName::General,
            variants: vec![Variant::dry_run(
                "photo",
                PolicyName::General,
                320,
                "photo-320.avif".into(),
            )],
        };
        assert!(format_error_report(&[clean]).is_empty());
    }

    #[test]
    fn summary_block_shape() {
        let lines = format_summary(&BatchSummary {
            total_inputs: 3,
            total_variants_generated: 13,
            inputs_with_errors: 1,
        });
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Done");
        assert!(lines[1].ends_with('3'));
        assert!(lines[2].ends_with("13"));
        assert!(lines[3].ends_with('1'));
    }

    #[test]
    fn event_lines_mark_errors() {
        let finished = BatchEvent::FileFinished {
            identity: "x".into(),
            policy: PolicyName::General,
            generated: 3,
            errors: 1,
        };
        assert_eq!(format_event(&finished), "    x: 3 variants, 1 errors");
    }
}
