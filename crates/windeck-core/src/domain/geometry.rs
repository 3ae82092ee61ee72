//! Click coordinate mapping between the displayed snapshot and the real window.
//!
//! The snapshot the operator looks at is a scaled (and possibly letterboxed)
//! rendition of the remote window.  A click lands somewhere inside the
//! rendered box; the window wants absolute pixel coordinates.  The mapping is
//! purely proportional:
//!
//! ```text
//! rx = (click_x - view.left) / view.width          (expected in [0, 1])
//! ry = (click_y - view.top)  / view.height
//! ax = round(rx * window_width)
//! ay = round(ry * window_height)
//! ```
//!
//! No clamping is performed: a click outside the rendered box produces an
//! out-of-range coordinate which is forwarded as-is.  That is a documented
//! edge case of the protocol, not something this module defends against.

/// The rendered bounding box of the displayed snapshot, in viewer pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRect {
    /// X coordinate of the box's left edge in the viewer's coordinate space.
    pub left: f64,
    /// Y coordinate of the box's top edge.
    pub top: f64,
    /// Rendered width of the snapshot.
    pub width: f64,
    /// Rendered height of the snapshot.
    pub height: f64,
}

impl ViewRect {
    /// A view box at the given origin with the given rendered size.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// The view box of an unletterboxed snapshot shown at its fetched size:
    /// the window's dimensions multiplied by the capture scale, at the origin.
    ///
    /// This is the console's default when the operator has not described an
    /// external viewer's geometry.
    pub fn of_scaled_snapshot(window_width: u32, window_height: u32, scale: f64) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: window_width as f64 * scale,
            height: window_height as f64 * scale,
        }
    }
}

/// Maps a click position inside `view` to absolute coordinates in a window of
/// `window_width` × `window_height` pixels.
///
/// Positions outside the view box map to out-of-range window coordinates and
/// are returned unchanged in that respect.  A degenerate view box (zero or
/// negative extent) maps everything to the window origin rather than dividing
/// by zero.
pub fn map_to_window(
    view: &ViewRect,
    click_x: f64,
    click_y: f64,
    window_width: u32,
    window_height: u32,
) -> (i32, i32) {
    if view.width <= 0.0 || view.height <= 0.0 {
        return (0, 0);
    }

    let rx = (click_x - view.left) / view.width;
    let ry = (click_y - view.top) / view.height;

    let ax = (rx * window_width as f64).round() as i32;
    let ay = (ry * window_height as f64).round() as i32;
    (ax, ay)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_click_maps_to_window_center() {
        // rx = ry = 0.5 on a 1200x800 window must land at (600, 400).
        let view = ViewRect::new(0.0, 0.0, 600.0, 400.0);
        assert_eq!(map_to_window(&view, 300.0, 200.0, 1200, 800), (600, 400));
    }

    #[test]
    fn test_origin_click_maps_to_window_origin() {
        let view = ViewRect::new(0.0, 0.0, 600.0, 400.0);
        assert_eq!(map_to_window(&view, 0.0, 0.0, 1200, 800), (0, 0));
    }

    #[test]
    fn test_far_corner_maps_to_full_window_dimensions() {
        let view = ViewRect::new(0.0, 0.0, 600.0, 400.0);
        assert_eq!(map_to_window(&view, 600.0, 400.0, 1200, 800), (1200, 800));
    }

    #[test]
    fn test_view_offset_is_subtracted_before_scaling() {
        // Same relative position as the center-click test, but the rendered
        // box sits at (100, 50) in the viewer.
        let view = ViewRect::new(100.0, 50.0, 600.0, 400.0);
        assert_eq!(map_to_window(&view, 400.0, 250.0, 1200, 800), (600, 400));
    }

    #[test]
    fn test_mapping_rounds_to_nearest_pixel() {
        // rx = 1/3 of 100 → 33.33… rounds to 33; ry = 2/3 of 100 → 66.67 → 67.
        let view = ViewRect::new(0.0, 0.0, 300.0, 300.0);
        assert_eq!(map_to_window(&view, 100.0, 200.0, 100, 100), (33, 67));
    }

    #[test]
    fn test_click_left_of_view_produces_negative_coordinate() {
        // Out-of-range input is forwarded, not clamped.
        let view = ViewRect::new(100.0, 0.0, 600.0, 400.0);
        let (ax, _) = map_to_window(&view, 40.0, 200.0, 1200, 800);
        assert!(ax < 0, "expected a negative x, got {ax}");
    }

    #[test]
    fn test_click_beyond_view_exceeds_window_dimensions() {
        let view = ViewRect::new(0.0, 0.0, 600.0, 400.0);
        let (ax, ay) = map_to_window(&view, 700.0, 500.0, 1200, 800);
        assert!(ax > 1200);
        assert!(ay > 800);
    }

    #[test]
    fn test_degenerate_view_maps_to_origin() {
        let view = ViewRect::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(map_to_window(&view, 10.0, 10.0, 1200, 800), (0, 0));
    }

    #[test]
    fn test_proportionality_across_grid_of_relative_positions() {
        // For a grid of (rx, ry) in [0,1]², the result must equal
        // (round(rx·W), round(ry·H)) exactly.
        let (w, h) = (1366u32, 768u32);
        let view = ViewRect::new(0.0, 0.0, 500.0, 250.0);
        for i in 0..=10 {
            for j in 0..=10 {
                let rx = i as f64 / 10.0;
                let ry = j as f64 / 10.0;
                let got = map_to_window(&view, rx * 500.0, ry * 250.0, w, h);
                let want = (
                    (rx * w as f64).round() as i32,
                    (ry * h as f64).round() as i32,
                );
                assert_eq!(got, want, "mismatch at rx={rx}, ry={ry}");
            }
        }
    }

    #[test]
    fn test_of_scaled_snapshot_uses_window_size_times_scale() {
        let view = ViewRect::of_scaled_snapshot(1200, 800, 0.5);
        assert_eq!(view, ViewRect::new(0.0, 0.0, 600.0, 400.0));
    }

    #[test]
    fn test_scaled_snapshot_view_round_trips_click_positions() {
        // Clicking pixel (ax·scale, ay·scale) on the scaled snapshot must map
        // back to (ax, ay) in the window (within rounding).
        let view = ViewRect::of_scaled_snapshot(1200, 800, 0.5);
        assert_eq!(map_to_window(&view, 450.0, 100.0, 1200, 800), (900, 200));
    }
}
