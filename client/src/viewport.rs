use curacao_shared::Bounds;

/// Pan/zoom transform from projected world units (Web Mercator, 256 at zoom 0)
/// to canvas CSS pixels. `scale` is pixels per world unit, i.e. `2^zoom`.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

const MIN_SCALE: f64 = 256.0; // zoom 8
const MAX_SCALE: f64 = 524_288.0; // zoom 19
const ZOOM_SENSITIVITY: f64 = 0.002;

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 4096.0,
        }
    }
}

impl Viewport {
    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        (
            wx * self.scale + self.offset_x,
            wy * self.scale + self.offset_y,
        )
    }

    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.offset_x) / self.scale,
            (sy - self.offset_y) / self.scale,
        )
    }

    /// Fractional slippy-map zoom level.
    pub fn zoom(&self) -> f64 {
        self.scale.log2()
    }

    /// Zoom toward a focus point (screen coordinates). Positive delta zooms out.
    pub fn zoom_at(&mut self, delta: f64, screen_x: f64, screen_y: f64) {
        let factor = (-delta * ZOOM_SENSITIVITY).exp();
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = new_scale / self.scale;

        self.offset_x = screen_x - (screen_x - self.offset_x) * ratio;
        self.offset_y = screen_y - (screen_y - self.offset_y) * ratio;
        self.scale = new_scale;
    }

    /// Pan by screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Put world point `(wx, wy)` at the canvas center at the given zoom level.
    pub fn center_on(&mut self, wx: f64, wy: f64, zoom: f64, canvas_w: f64, canvas_h: f64) {
        self.scale = 2f64.powf(zoom).clamp(MIN_SCALE, MAX_SCALE);
        self.offset_x = canvas_w / 2.0 - wx * self.scale;
        self.offset_y = canvas_h / 2.0 - wy * self.scale;
    }

    /// Fit the viewport to show the given world-coordinate bounds with padding.
    #[allow(clippy::too_many_arguments)]
    pub fn fit_bounds(
        &mut self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        canvas_w: f64,
        canvas_h: f64,
        padding: f64,
    ) {
        let world_w = max_x - min_x;
        let world_h = max_y - min_y;

        if world_w <= 0.0 || world_h <= 0.0 || canvas_w <= 0.0 || canvas_h <= 0.0 {
            return;
        }

        let scale_x = canvas_w / (world_w * (1.0 + padding * 2.0));
        let scale_y = canvas_h / (world_h * (1.0 + padding * 2.0));
        self.scale = scale_x.min(scale_y).clamp(MIN_SCALE, MAX_SCALE);

        let center_x = (min_x + max_x) / 2.0;
        let center_y = (min_y + max_y) / 2.0;
        self.offset_x = canvas_w / 2.0 - center_x * self.scale;
        self.offset_y = canvas_h / 2.0 - center_y * self.scale;
    }

    /// Fit to a lon/lat box.
    pub fn fit_geo_bounds(&mut self, bounds: &Bounds, canvas_w: f64, canvas_h: f64, padding: f64) {
        if bounds.is_empty() {
            return;
        }
        let (min_x, min_y, max_x, max_y) = bounds.projected();
        self.fit_bounds(min_x, min_y, max_x, max_y, canvas_w, canvas_h, padding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(diff < 1e-6, "expected {expected}, got {actual} (diff: {diff})");
    }

    #[test]
    fn screen_world_roundtrip() {
        let vp = Viewport {
            offset_x: -1000.0,
            offset_y: 250.0,
            scale: 2048.0,
        };
        let (sx, sy) = vp.world_to_screen(85.0, 120.5);
        let (wx, wy) = vp.screen_to_world(sx, sy);
        assert_close(wx, 85.0);
        assert_close(wy, 120.5);
    }

    #[test]
    fn zoom_at_keeps_focus_point_fixed() {
        let mut vp = Viewport::default();
        let before = vp.screen_to_world(300.0, 200.0);
        vp.zoom_at(-240.0, 300.0, 200.0);
        let after = vp.screen_to_world(300.0, 200.0);
        assert_close(before.0, after.0);
        assert_close(before.1, after.1);
        assert!(vp.scale > Viewport::default().scale);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = Viewport::default();
        vp.zoom_at(1.0e6, 0.0, 0.0);
        assert_close(vp.scale, MIN_SCALE);
        vp.zoom_at(-1.0e6, 0.0, 0.0);
        assert_close(vp.scale, MAX_SCALE);
    }

    #[test]
    fn fit_bounds_centers_box() {
        let mut vp = Viewport::default();
        vp.fit_bounds(100.0, 120.0, 100.2, 120.1, 800.0, 600.0, 0.0);
        let (cx, cy) = vp.world_to_screen(100.1, 120.05);
        assert_close(cx, 400.0);
        assert_close(cy, 300.0);
        assert_close(vp.scale, 4000.0);
    }

    #[test]
    fn fit_bounds_ignores_degenerate_input() {
        let mut vp = Viewport::default();
        vp.fit_bounds(1.0, 1.0, 1.0, 2.0, 800.0, 600.0, 0.1);
        assert_eq!(vp, Viewport::default());
        vp.fit_geo_bounds(&Bounds::empty(), 800.0, 600.0, 0.1);
        assert_eq!(vp, Viewport::default());
    }

    #[test]
    fn center_on_places_point_mid_canvas() {
        let mut vp = Viewport::default();
        vp.center_on(80.0, 120.0, 16.0, 1000.0, 800.0);
        assert_close(vp.zoom(), 16.0);
        let (sx, sy) = vp.world_to_screen(80.0, 120.0);
        assert_close(sx, 500.0);
        assert_close(sy, 400.0);
    }
}
