use egui::{Pos2, Vec2};

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 5.0;

/// Pan offset and zoom factor mapping logical canvas space to the screen.
///
/// `screen = logical * zoom + pan`. The transform never triggers a repaint
/// itself; callers redraw after mutating it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pan: Vec2,
    zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(MIN_ZOOM, MAX_ZOOM)
    }
}

impl Viewport {
    /// A bad zoom range (non-finite, non-positive or inverted) falls back
    /// to the default range.
    pub fn new(min_zoom: f32, max_zoom: f32) -> Self {
        let (min_zoom, max_zoom) =
            if min_zoom.is_finite() && max_zoom.is_finite() && 0.0 < min_zoom && min_zoom <= max_zoom {
                (min_zoom, max_zoom)
            } else {
                log::warn!("Ignoring zoom range {min_zoom}..{max_zoom}");
                (MIN_ZOOM, MAX_ZOOM)
            };
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            min_zoom,
            max_zoom,
        }
    }

    pub fn pan_offset(&self) -> Vec2 {
        self.pan
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn to_logical(&self, screen: Pos2) -> Pos2 {
        Pos2::new(
            (screen.x - self.pan.x) / self.zoom,
            (screen.y - self.pan.y) / self.zoom,
        )
    }

    pub fn to_screen(&self, logical: Pos2) -> Pos2 {
        Pos2::new(
            logical.x * self.zoom + self.pan.x,
            logical.y * self.zoom + self.pan.y,
        )
    }

    /// Offsets the view by a raw screen-space delta. Not scaled by zoom.
    pub fn pan(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    pub fn zoom_by(&mut self, delta: f32) {
        if !delta.is_finite() {
            log::warn!("Ignoring non-finite zoom delta {delta}");
            return;
        }
        self.zoom = (self.zoom + delta).clamp(self.min_zoom, self.max_zoom);
    }

    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = Vec2::ZERO;
    }
}
