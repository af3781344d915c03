//! Pure calculation functions for fit geometry.
//!
//! All functions here are pure and testable without any I/O or images. The
//! integer rules are fixed: the dominant axis takes the target exactly, the
//! other axis is rounded, and crop/placement origins use floor division.

/// Calculate dimensions needed to cover a target area (resize before crop).
///
/// `scale = max(tw / w, th / h)`. The axis that produced the larger ratio
/// matches the target exactly; the other is `round(dim * scale)` and never
/// less than its target, so the centered crop never reaches past the edge.
///
/// # Examples
/// ```
/// # use cropbatch::imaging::calculations::cover_dimensions;
/// // 2000x1000 landscape into a 300x300 square → height matches
/// assert_eq!(cover_dimensions((2000, 1000), (300, 300)), (600, 300));
///
/// // 1x1000 sliver into 500x500 → width matches, height overflows
/// assert_eq!(cover_dimensions((1, 1000), (500, 500)), (500, 500_000));
/// ```
pub fn cover_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let width_ratio = tgt_w as f64 / src_w as f64;
    let height_ratio = tgt_h as f64 / src_h as f64;

    if width_ratio >= height_ratio {
        // Width drives the scale: width matches, height may exceed
        let h = (src_h as f64 * width_ratio).round() as u32;
        (tgt_w, h.max(tgt_h))
    } else {
        // Height drives the scale: height matches, width may exceed
        let w = (src_w as f64 * height_ratio).round() as u32;
        (w.max(tgt_w), tgt_h)
    }
}

/// Top-left corner of the centered `target` window inside `resized`.
///
/// Floor division on both axes; an axis that already matches yields 0.
pub fn crop_origin(resized: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    (
        resized.0.saturating_sub(target.0) / 2,
        resized.1.saturating_sub(target.1) / 2,
    )
}

/// Source-space window that [`cover_dimensions`] followed by [`crop_origin`]
/// would keep, as `(origin, size)`.
///
/// Cropping this window first and resizing it straight to the target never
/// allocates more than the source, however thin the source is.
///
/// # Examples
/// ```
/// # use cropbatch::imaging::calculations::cover_window;
/// // 2000x1000 into 300x300 → the centered 1000x1000 square
/// assert_eq!(cover_window((2000, 1000), (300, 300)), ((500, 0), (1000, 1000)));
///
/// // 1x20000 sliver into 500x667 → a single source pixel
/// assert_eq!(cover_window((1, 20000), (500, 667)), ((0, 9999), (1, 1)));
/// ```
pub fn cover_window(source: (u32, u32), target: (u32, u32)) -> ((u32, u32), (u32, u32)) {
    let resized = cover_dimensions(source, target);
    let span = |tgt: u32, src: u32, res: u32| {
        ((tgt as f64 * src as f64 / res as f64).round() as u32).clamp(1, src)
    };
    let size = (
        span(target.0, source.0, resized.0),
        span(target.1, source.1, resized.1),
    );
    (crop_origin(source, size), size)
}

/// Calculate dimensions that fit entirely inside a target area.
///
/// `scale = min(tw / w, th / h)`. The limiting axis matches the target, the
/// other is rounded and clamped to `1..=target`.
pub fn contain_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let width_ratio = tgt_w as f64 / src_w as f64;
    let height_ratio = tgt_h as f64 / src_h as f64;

    if width_ratio <= height_ratio {
        let h = (src_h as f64 * width_ratio).round() as u32;
        (tgt_w, h.clamp(1, tgt_h))
    } else {
        let w = (src_w as f64 * height_ratio).round() as u32;
        (w.clamp(1, tgt_w), tgt_h)
    }
}

/// Offset that centers `inner` inside `outer` (floor division).
pub fn center_offset(outer: (u32, u32), inner: (u32, u32)) -> (u32, u32) {
    crop_origin(outer, inner)
}

/// Component-wise maximum over a set of target sizes.
///
/// This is the smallest source a profile accepts without upscaling past its
/// largest output on either axis. Returns `(0, 0)` for an empty set.
pub fn minimum_source_dimensions(targets: impl IntoIterator<Item = (u32, u32)>) -> (u32, u32) {
    targets
        .into_iter()
        .fold((0, 0), |(w, h), (tw, th)| (w.max(tw), h.max(th)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // cover_dimensions tests
    // =========================================================================

    #[test]
    fn cover_wide_source_to_square() {
        // 2000x1000 → 300x300: height ratio 0.3 beats width ratio 0.15
        assert_eq!(cover_dimensions((2000, 1000), (300, 300)), (600, 300));
    }

    #[test]
    fn cover_tall_source_to_square() {
        assert_eq!(cover_dimensions((1000, 2000), (900, 900)), (900, 1800));
    }

    #[test]
    fn cover_portrait_target_from_landscape() {
        // 800x600 → 225x300: height ratio 0.5 wins, width = 400
        assert_eq!(cover_dimensions((800, 600), (225, 300)), (400, 300));
    }

    #[test]
    fn cover_same_aspect_ratio_matches_exactly() {
        assert_eq!(cover_dimensions((800, 600), (400, 300)), (400, 300));
    }

    #[test]
    fn cover_upscales_small_sources() {
        assert_eq!(cover_dimensions((100, 50), (450, 450)), (900, 450));
    }

    #[test]
    fn cover_degenerate_sliver() {
        assert_eq!(cover_dimensions((1, 1000), (500, 500)), (500, 500_000));
        assert_eq!(cover_dimensions((1000, 1), (500, 500)), (500_000, 500));
    }

    #[test]
    fn cover_rounds_the_overflowing_axis() {
        // 3x7 → 2x2: width ratio 2/3, height = 7 * 2/3 = 4.67 → 5
        assert_eq!(cover_dimensions((3, 7), (2, 2)), (2, 5));
    }

    // =========================================================================
    // crop_origin tests
    // =========================================================================

    #[test]
    fn crop_origin_centers_with_floor_division() {
        assert_eq!(crop_origin((600, 300), (300, 300)), (150, 0));
        assert_eq!(crop_origin((301, 300), (300, 300)), (0, 0));
        assert_eq!(crop_origin((303, 305), (300, 300)), (1, 2));
    }

    #[test]
    fn crop_origin_zero_when_exact() {
        assert_eq!(crop_origin((500, 667), (500, 667)), (0, 0));
    }

    // =========================================================================
    // cover_window tests
    // =========================================================================

    #[test]
    fn cover_window_keeps_centered_square_of_landscape() {
        assert_eq!(cover_window((2000, 1000), (300, 300)), ((500, 0), (1000, 1000)));
    }

    #[test]
    fn cover_window_is_whole_source_when_aspect_matches() {
        assert_eq!(cover_window((800, 600), (400, 300)), ((0, 0), (800, 600)));
        assert_eq!(cover_window((10, 10), (10, 10)), ((0, 0), (10, 10)));
    }

    #[test]
    fn cover_window_of_sliver_stays_within_source() {
        // The full cover resize would be 500x10000000.
        assert_eq!(cover_dimensions((1, 20000), (500, 667)), (500, 10_000_000));
        assert_eq!(cover_window((1, 20000), (500, 667)), ((0, 9999), (1, 1)));
        assert_eq!(cover_window((20000, 1), (667, 500)), ((9999, 0), (1, 1)));
    }

    #[test]
    fn cover_window_for_portrait_target() {
        // 800x600 → 225x300: resized 400x300, window 450x600 at x = 175
        assert_eq!(cover_window((800, 600), (225, 300)), ((175, 0), (450, 600)));
    }

    // =========================================================================
    // contain_dimensions tests
    // =========================================================================

    #[test]
    fn contain_wide_source_limits_on_width() {
        assert_eq!(contain_dimensions((2000, 1000), (300, 300)), (300, 150));
    }

    #[test]
    fn contain_tall_source_limits_on_height() {
        assert_eq!(contain_dimensions((1000, 2000), (300, 300)), (150, 300));
    }

    #[test]
    fn contain_never_collapses_an_axis() {
        assert_eq!(contain_dimensions((1000, 1), (100, 100)), (100, 1));
    }

    #[test]
    fn contain_same_aspect_matches_exactly() {
        assert_eq!(contain_dimensions((450, 600), (225, 300)), (225, 300));
    }

    #[test]
    fn center_offset_places_fitted_image() {
        assert_eq!(center_offset((300, 300), (300, 150)), (0, 75));
        assert_eq!(center_offset((300, 300), (151, 300)), (74, 0));
    }

    // =========================================================================
    // minimum_source_dimensions tests
    // =========================================================================

    #[test]
    fn minimum_source_is_component_wise_max() {
        let min = minimum_source_dimensions([(225, 300), (500, 667), (700, 100)]);
        assert_eq!(min, (700, 667));
    }

    #[test]
    fn minimum_source_of_nothing_is_zero() {
        assert_eq!(minimum_source_dimensions([]), (0, 0));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dimension() -> impl Strategy<Value = u32> {
        1u32..=5000
    }

    proptest! {
        /// Property: the pre-crop image always covers the target on both axes.
        #[test]
        fn prop_cover_never_smaller_than_target(
            src in (dimension(), dimension()),
            tgt in (dimension(), dimension()),
        ) {
            let (w, h) = cover_dimensions(src, tgt);
            prop_assert!(w >= tgt.0 && h >= tgt.1, "{src:?} -> {tgt:?} gave {w}x{h}");
        }

        /// Property: one axis of the cover resize matches the target exactly.
        #[test]
        fn prop_cover_matches_one_axis(
            src in (dimension(), dimension()),
            tgt in (dimension(), dimension()),
        ) {
            let (w, h) = cover_dimensions(src, tgt);
            prop_assert!(w == tgt.0 || h == tgt.1);
        }

        /// Property: the crop window always lies inside the resized image.
        #[test]
        fn prop_crop_window_in_bounds(
            src in (dimension(), dimension()),
            tgt in (dimension(), dimension()),
        ) {
            let resized = cover_dimensions(src, tgt);
            let (left, top) = crop_origin(resized, tgt);
            prop_assert!(left + tgt.0 <= resized.0);
            prop_assert!(top + tgt.1 <= resized.1);
        }

        /// Property: the source-space window is non-empty and inside the source.
        #[test]
        fn prop_cover_window_in_source(
            src in (dimension(), dimension()),
            tgt in (dimension(), dimension()),
        ) {
            let ((left, top), (w, h)) = cover_window(src, tgt);
            prop_assert!(w >= 1 && h >= 1);
            prop_assert!(left + w <= src.0 && top + h <= src.1);
        }

        /// Property: contain output fits inside the target and is never empty.
        #[test]
        fn prop_contain_fits_inside(
            src in (dimension(), dimension()),
            tgt in (dimension(), dimension()),
        ) {
            let (w, h) = contain_dimensions(src, tgt);
            prop_assert!((1..=tgt.0).contains(&w));
            prop_assert!((1..=tgt.1).contains(&h));
        }
    }
}
