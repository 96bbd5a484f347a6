//! Pure calculation functions for variant dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Filter a policy's width list against an optional cap.
///
/// Widths above the cap are skipped entirely — no variant is emitted for
/// them, not even an error. Order is preserved (ascending by policy
/// invariant).
pub fn surviving_widths(widths: &[u32], cap: Option<u32>) -> Vec<u32> {
    widths
        .iter()
        .copied()
        .filter(|&w| cap.is_none_or(|c| w <= c))
        .collect()
}

/// Clamp a nominal target width to the source's native width.
///
/// "Without enlargement" semantics: a target beyond the native width is a
/// no-op at native size. The nominal target still names the output file.
pub fn clamped_target_width(native_width: u32, target: u32) -> u32 {
    target.min(native_width)
}

/// Height that preserves aspect ratio at the given output width.
pub fn scaled_height(source: (u32, u32), out_width: u32) -> u32 {
    let (src_w, src_h) = source;
    if src_w == 0 {
        return src_h;
    }
    let h = (src_h as f64 * out_width as f64 / src_w as f64).round() as u32;
    h.max(1)
}

/// Dimensions that fit the source inside a square box of the given edge,
/// preserving aspect ratio without cropping. The longer edge matches the
/// box exactly; small sources are scaled up to fill it.
pub fn contain_dimensions(source: (u32, u32), box_edge: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return (box_edge, box_edge);
    }
    if src_w >= src_h {
        let h = (src_h as f64 * box_edge as f64 / src_w as f64).round() as u32;
        (box_edge, h.max(1))
    } else {
        let w = (src_w as f64 * box_edge as f64 / src_h as f64).round() as u32;
        (w.max(1), box_edge)
    }
}

/// Top-left offset that centers `inner` dimensions inside a square canvas.
pub fn centered_offset(inner: (u32, u32), box_edge: u32) -> (i64, i64) {
    let (w, h) = inner;
    (
        (i64::from(box_edge) - i64::from(w)) / 2,
        (i64::from(box_edge) - i64::from(h)) / 2,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surviving_widths_without_cap_keeps_all() {
        assert_eq!(
            surviving_widths(&[400, 720, 800], None),
            vec![400, 720, 800]
        );
    }

    #[test]
    fn surviving_widths_cap_is_inclusive() {
        assert_eq!(
            surviving_widths(&[400, 720, 800, 1200], Some(800)),
            vec![400, 720, 800]
        );
    }

    #[test]
    fn surviving_widths_cap_below_all_yields_empty() {
        assert_eq!(surviving_widths(&[400, 720], Some(100)), Vec::<u32>::new());
    }

    #[test]
    fn clamp_never_enlarges() {
        assert_eq!(clamped_target_width(2000, 1440), 1440);
        assert_eq!(clamped_target_width(100, 128), 100);
        assert_eq!(clamped_target_width(100, 100), 100);
    }

    #[test]
    fn scaled_height_preserves_aspect() {
        assert_eq!(scaled_height((2000, 1000), 400), 200);
        assert_eq!(scaled_height((1500, 2000), 750), 1000);
    }

    #[test]
    fn scaled_height_never_reaches_zero() {
        assert_eq!(scaled_height((4000, 10), 16), 1);
    }

    #[test]
    fn contain_landscape_letterboxes_height() {
        // 64x32 into a 64 box: width fills, height letterboxed
        assert_eq!(contain_dimensions((64, 32), 64), (64, 32));
        assert_eq!(contain_dimensions((200, 100), 64), (64, 32));
    }

    #[test]
    fn contain_portrait_letterboxes_width() {
        assert_eq!(contain_dimensions((100, 200), 64), (32, 64));
    }

    #[test]
    fn contain_scales_small_sources_up() {
        // Icon canvases fill the box even from a smaller source.
        assert_eq!(contain_dimensions((16, 16), 64), (64, 64));
        assert_eq!(contain_dimensions((16, 8), 64), (64, 32));
    }

    #[test]
    fn centered_offset_splits_slack_evenly() {
        assert_eq!(centered_offset((64, 32), 64), (0, 16));
        assert_eq!(centered_offset((32, 64), 64), (16, 0));
        assert_eq!(centered_offset((64, 64), 64), (0, 0));
    }
}
