use egui::{Color32, Pos2, Vec2};

use crate::config::EngineSettings;
use crate::document::DrawingContent;
use crate::error::RenderError;
use crate::stroke::{Stroke, StrokeTool};
use crate::viewport::Viewport;

pub mod outline;
pub mod raster;

pub use outline::{OutlineOptions, stroke_outline};
pub use raster::RasterSurface;

/// Trail shown while the eraser is dragged. Never stored.
const ERASER_PREVIEW_COLOR: Color32 = Color32::from_rgb(160, 160, 160);
const ERASER_PREVIEW_OPACITY: f32 = 0.35;

/// A 2D paint target with a save/restore transform stack.
pub trait Surface {
    fn clear(&mut self) -> Result<(), RenderError>;

    /// Pushes the current transform.
    fn save(&mut self);

    /// Pops the transform pushed by the matching [`Surface::save`].
    fn restore(&mut self) -> Result<(), RenderError>;

    fn translate(&mut self, offset: Vec2) -> Result<(), RenderError>;

    fn scale(&mut self, factor: f32) -> Result<(), RenderError>;

    fn fill_polygon(
        &mut self,
        points: &[Pos2],
        color: Color32,
        opacity: f32,
    ) -> Result<(), RenderError>;
}

/// Paints drawing content onto a [`Surface`].
#[derive(Debug, Clone, PartialEq)]
pub struct Renderer {
    highlighter_opacity: f32,
    highlighter_thinning: f32,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(&EngineSettings::default())
    }
}

impl Renderer {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            highlighter_opacity: settings.highlighter_opacity.clamp(0.0, 1.0),
            highlighter_thinning: settings.highlighter_thinning.clamp(-1.0, 1.0),
        }
    }

    /// Opacity the stroke is actually painted with.
    pub fn effective_opacity(&self, stroke: &Stroke) -> f32 {
        match stroke.tool() {
            StrokeTool::Pen => stroke.opacity(),
            StrokeTool::Highlighter => self.highlighter_opacity,
            StrokeTool::Eraser => ERASER_PREVIEW_OPACITY,
        }
    }

    pub fn effective_color(&self, stroke: &Stroke) -> Color32 {
        match stroke.tool() {
            StrokeTool::Pen | StrokeTool::Highlighter => stroke.color(),
            StrokeTool::Eraser => ERASER_PREVIEW_COLOR,
        }
    }

    /// Outline options after tool-specific overrides.
    pub fn effective_outline(&self, stroke: &Stroke) -> OutlineOptions {
        let mut options = stroke.outline().clone();
        match stroke.tool() {
            StrokeTool::Pen => {}
            StrokeTool::Highlighter => options.thinning = self.highlighter_thinning,
            StrokeTool::Eraser => options.thinning = 0.0,
        }
        options
    }

    /// Fills one stroke in the surface's current transform. No-op below two points.
    pub fn paint_stroke(
        &self,
        surface: &mut dyn Surface,
        stroke: &Stroke,
        complete: bool,
    ) -> Result<(), RenderError> {
        if stroke.points().len() < 2 {
            return Ok(());
        }
        let outline = stroke_outline(
            stroke.points(),
            stroke.size(),
            &self.effective_outline(stroke),
            complete,
        );
        if outline.is_empty() {
            return Ok(());
        }
        surface.fill_polygon(
            &outline,
            self.effective_color(stroke),
            self.effective_opacity(stroke),
        )
    }

    /// Clears the surface and paints every committed stroke in order, then
    /// the in-progress stroke on top.
    ///
    /// Returns false if painting failed; the surface transform is restored
    /// either way.
    pub fn render(
        &self,
        surface: &mut dyn Surface,
        content: &DrawingContent,
        viewport: &Viewport,
        in_progress: Option<&Stroke>,
    ) -> bool {
        if let Err(err) = surface.clear() {
            log::warn!("Skipping render: {err}");
            return false;
        }
        self.with_viewport(surface, viewport, |renderer, surface| {
            for stroke in content.strokes() {
                renderer.paint_stroke(surface, stroke, true)?;
            }
            if let Some(stroke) = in_progress {
                renderer.paint_stroke(surface, stroke, false)?;
            }
            Ok(())
        })
    }

    /// Paints only the in-progress stroke over whatever the surface holds.
    pub fn render_overlay(
        &self,
        surface: &mut dyn Surface,
        viewport: &Viewport,
        stroke: &Stroke,
    ) -> bool {
        self.with_viewport(surface, viewport, |renderer, surface| {
            renderer.paint_stroke(surface, stroke, false)
        })
    }

    fn with_viewport(
        &self,
        surface: &mut dyn Surface,
        viewport: &Viewport,
        paint: impl FnOnce(&Self, &mut dyn Surface) -> Result<(), RenderError>,
    ) -> bool {
        surface.save();
        let result = surface
            .translate(viewport.pan_offset())
            .and_then(|()| surface.scale(viewport.zoom()))
            .and_then(|()| paint(self, &mut *surface));
        if let Err(err) = surface.restore() {
            log::error!("Surface transform stack corrupted: {err}");
        }
        match result {
            Ok(()) => true,
            Err(err) => {
                log::error!("Render aborted: {err}");
                false
            }
        }
    }
}
