use egui::{Color32, ColorImage, Pos2, Vec2};
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Transform};

use super::Surface;
use crate::error::RenderError;

/// Software raster target backed by a tiny-skia pixmap.
///
/// Outlines are filled anti-aliased with the nonzero winding rule and
/// blended source-over. A zero-sized surface has no pixmap and reports
/// itself unavailable.
#[derive(Clone)]
pub struct RasterSurface {
    pixmap: Option<Pixmap>,
    width: u32,
    height: u32,
    transform: Transform,
    stack: Vec<Transform>,
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("transform", &self.transform)
            .field("depth", &self.stack.len())
            .finish()
    }
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixmap: Pixmap::new(width, height),
            width,
            height,
            transform: Transform::identity(),
            stack: Vec::new(),
        }
    }

    /// Reallocates the pixel buffer when the size changed. Returns true if it did.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        self.pixmap = Pixmap::new(width, height);
        self.width = width;
        self.height = height;
        true
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Straight-alpha RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let color = self.pixmap.as_ref()?.pixel(x, y)?.demultiply();
        Some([color.red(), color.green(), color.blue(), color.alpha()])
    }

    /// Number of transforms currently saved.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Current transform as `(offset, scale)`.
    pub fn transform(&self) -> (Vec2, f32) {
        (Vec2::new(self.transform.tx, self.transform.ty), self.transform.sx)
    }

    /// Copies the pixels of `other` into this surface.
    pub fn copy_from(&mut self, other: &RasterSurface) {
        match (&mut self.pixmap, &other.pixmap) {
            (Some(dst), Some(src)) if dst.width() == src.width() && dst.height() == src.height() => {
                dst.data_mut().copy_from_slice(src.data());
            }
            _ => {
                self.pixmap = other.pixmap.clone();
                self.width = other.width;
                self.height = other.height;
            }
        }
    }

    pub fn to_color_image(&self) -> ColorImage {
        let size = [self.width as usize, self.height as usize];
        match &self.pixmap {
            Some(pixmap) => ColorImage::from_rgba_premultiplied(size, pixmap.data()),
            None => ColorImage::new(size, Color32::TRANSPARENT),
        }
    }

    fn pixmap_mut(&mut self) -> Result<&mut Pixmap, RenderError> {
        let (width, height) = (self.width, self.height);
        self.pixmap
            .as_mut()
            .ok_or(RenderError::SurfaceUnavailable { width, height })
    }
}

impl Surface for RasterSurface {
    fn clear(&mut self) -> Result<(), RenderError> {
        self.pixmap_mut()?.fill(Color::TRANSPARENT);
        Ok(())
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) -> Result<(), RenderError> {
        self.transform = self.stack.pop().ok_or(RenderError::UnbalancedRestore)?;
        Ok(())
    }

    fn translate(&mut self, offset: Vec2) -> Result<(), RenderError> {
        if !offset.x.is_finite() || !offset.y.is_finite() {
            return Err(RenderError::InvalidTransform(format!("translate by {offset:?}")));
        }
        self.transform = self.transform.pre_translate(offset.x, offset.y);
        Ok(())
    }

    fn scale(&mut self, factor: f32) -> Result<(), RenderError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(RenderError::InvalidTransform(format!("scale by {factor}")));
        }
        self.transform = self.transform.pre_scale(factor, factor);
        Ok(())
    }

    fn fill_polygon(
        &mut self,
        points: &[Pos2],
        color: Color32,
        opacity: f32,
    ) -> Result<(), RenderError> {
        let transform = self.transform;
        let pixmap = self.pixmap_mut()?;
        if points.len() < 3 || opacity <= 0.0 {
            return Ok(());
        }
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(RenderError::InvalidTransform("non-finite polygon vertex".to_owned()));
        }

        let mut builder = PathBuilder::new();
        builder.move_to(points[0].x, points[0].y);
        for p in &points[1..] {
            builder.line_to(p.x, p.y);
        }
        builder.close();
        // Degenerate outlines (all points collinear) have no area to fill.
        let Some(path) = builder.finish() else {
            return Ok(());
        };

        let mut paint = Paint::default();
        let alpha = (opacity.min(1.0) * 255.0).round() as u8;
        paint.set_color_rgba8(color.r(), color.g(), color.b(), alpha);
        paint.anti_alias = true;
        pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
        Ok(())
    }
}
