use egui::Color32;
use std::sync::Arc;

use crate::config::{BrushSettings, CanvasConfig, EngineSettings};
use crate::document::{DrawingContent, PageId};
use crate::event::{CanvasEvent, CanvasObserver, EventBus};
use crate::history::History;
use crate::input::{InputEvent, PointerSample, Shortcut};
use crate::persistence::{PersistenceBridge, SaveBackend, SaveStatus};
use crate::pressure::PressureModel;
use crate::renderer::outline::OutlineOptions;
use crate::renderer::{Renderer, Surface};
use crate::stroke::{Stroke, StrokePoint};
use crate::tools::{CaptureOutcome, EraserEngine, MoveOutcome, StrokeCapture, Tool};
use crate::viewport::Viewport;

/// What the host needs to redraw after an engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Repaint {
    #[default]
    None,
    /// Only the in-progress stroke changed.
    Overlay,
    /// Committed content or the viewport changed.
    Full,
}

impl Repaint {
    /// The stronger of two repaint requests.
    pub fn merge(self, other: Repaint) -> Repaint {
        self.max(other)
    }
}

/// One open drawing: strokes, view, gesture state, history and saving.
///
/// The engine is driven entirely by its host. Feed it input with
/// [`InkCanvas::handle_event`], call [`InkCanvas::poll`] every frame so
/// debounced saves fire, and repaint according to the returned [`Repaint`].
#[derive(Debug)]
pub struct InkCanvas {
    brush: BrushSettings,
    settings: EngineSettings,
    content: DrawingContent,
    viewport: Viewport,
    capture: StrokeCapture,
    renderer: Renderer,
    eraser: EraserEngine,
    history: History,
    persistence: PersistenceBridge,
    events: EventBus,
    // Latest host time seen, in milliseconds.
    clock_ms: f64,
}

impl InkCanvas {
    pub fn new(
        config: CanvasConfig,
        page: PageId,
        content: DrawingContent,
        backend: Box<dyn SaveBackend>,
    ) -> Self {
        let CanvasConfig { brush, engine } = config;
        let mut history = History::new(engine.history_depth);
        history.snapshot(content.share_strokes());
        log::info!("Opened page {page} with {} strokes", content.len());

        Self {
            viewport: Viewport::new(engine.min_zoom, engine.max_zoom),
            capture: StrokeCapture::new(PressureModel::new(engine.pressure_velocity_scale)),
            renderer: Renderer::new(&engine),
            eraser: EraserEngine::new(engine.eraser_radius_factor),
            persistence: PersistenceBridge::new(page, backend, engine.save_debounce_ms),
            events: EventBus::new(),
            history,
            content,
            brush,
            settings: engine,
            clock_ms: 0.0,
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn CanvasObserver>) {
        self.events.subscribe(observer);
    }

    pub fn page(&self) -> PageId {
        self.persistence.page()
    }

    pub fn content(&self) -> &DrawingContent {
        &self.content
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn capture(&self) -> &StrokeCapture {
        &self.capture
    }

    /// The stroke currently being drawn, as it would render.
    pub fn in_progress(&self) -> Option<Stroke> {
        self.capture.preview()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.persistence.status()
    }

    pub fn is_saving(&self) -> bool {
        self.persistence.is_saving()
    }

    /// When the next debounced save is due, for hosts that sleep between frames.
    pub fn next_save_deadline(&self) -> Option<f64> {
        self.persistence.next_deadline()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Brush settings -------------------------------------------------

    /// Tool for the next gesture. A gesture already underway keeps its tool.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.brush.tool != tool {
            log::debug!("Tool changed to {}", tool.name());
            self.brush.tool = tool;
        }
    }

    pub fn set_color(&mut self, color: Color32) -> Repaint {
        self.brush.color = color;
        self.restyle()
    }

    /// Ignores sizes that are not finite and positive.
    pub fn set_size(&mut self, size: f32) -> Repaint {
        if !size.is_finite() || size <= 0.0 {
            log::warn!("Ignoring invalid brush size {size}");
            return Repaint::None;
        }
        self.brush.size = size;
        self.restyle()
    }

    pub fn set_opacity(&mut self, opacity: f32) -> Repaint {
        if !opacity.is_finite() {
            log::warn!("Ignoring invalid opacity {opacity}");
            return Repaint::None;
        }
        self.brush.opacity = opacity.clamp(0.0, 1.0);
        self.restyle()
    }

    pub fn set_thinning(&mut self, thinning: f32) -> Repaint {
        self.update_outline(|outline| outline.thinning = thinning)
    }

    pub fn set_smoothing(&mut self, smoothing: f32) -> Repaint {
        self.update_outline(|outline| outline.smoothing = smoothing)
    }

    pub fn set_streamline(&mut self, streamline: f32) -> Repaint {
        self.update_outline(|outline| outline.streamline = streamline)
    }

    pub fn set_simulate_pressure(&mut self, simulate: bool) -> Repaint {
        self.update_outline(|outline| outline.simulate_pressure = simulate)
    }

    pub fn set_cap_start(&mut self, cap: bool) -> Repaint {
        self.update_outline(|outline| outline.cap_start = cap)
    }

    pub fn set_cap_end(&mut self, cap: bool) -> Repaint {
        self.update_outline(|outline| outline.cap_end = cap)
    }

    pub fn set_taper_start(&mut self, taper: f32) -> Repaint {
        self.update_outline(|outline| outline.taper_start = taper)
    }

    pub fn set_taper_end(&mut self, taper: f32) -> Repaint {
        self.update_outline(|outline| outline.taper_end = taper)
    }

    /// Replaces every brush setting at once.
    pub fn set_brush(&mut self, brush: BrushSettings) -> Repaint {
        let mut brush = brush;
        let outline = brush.outline();
        brush.set_outline(&outline);
        if !brush.size.is_finite() || brush.size <= 0.0 {
            brush.size = self.brush.size;
        }
        brush.opacity = if brush.opacity.is_finite() {
            brush.opacity.clamp(0.0, 1.0)
        } else {
            self.brush.opacity
        };
        self.brush = brush;
        self.restyle()
    }

    fn update_outline(&mut self, change: impl FnOnce(&mut OutlineOptions)) -> Repaint {
        let mut outline = self.brush.outline();
        change(&mut outline);
        self.brush.set_outline(&outline);
        self.restyle()
    }

    // Cosmetic changes apply to the whole in-progress stroke; a thinner
    // result must not leave the old pixels behind, hence a full repaint.
    fn restyle(&mut self) -> Repaint {
        if self.capture.restyle(&self.brush) {
            Repaint::Full
        } else {
            Repaint::None
        }
    }

    // --- Input ----------------------------------------------------------

    pub fn handle_event(&mut self, event: &InputEvent) -> Repaint {
        match event {
            InputEvent::PointerDown(sample) => self.pointer_down(sample),
            InputEvent::PointerMove(sample) => self.pointer_move(sample),
            InputEvent::PointerUp(sample) | InputEvent::PointerCancel(sample) => {
                self.pointer_up(sample)
            }
            InputEvent::Zoom { delta } => self.zoom_by(delta * self.settings.wheel_zoom_speed),
            InputEvent::Shortcut(shortcut) => self.apply_shortcut(*shortcut),
        }
    }

    /// Handles a batch of events, returning the strongest repaint needed.
    pub fn handle_events<'a>(&mut self, events: impl IntoIterator<Item = &'a InputEvent>) -> Repaint {
        events
            .into_iter()
            .fold(Repaint::None, |repaint, event| repaint.merge(self.handle_event(event)))
    }

    fn pointer_down(&mut self, sample: &PointerSample) -> Repaint {
        self.advance_clock(sample.time_ms);
        if !self.capture.begin(sample, &self.brush, &self.viewport) {
            return Repaint::None;
        }
        if self.capture.active_stroke().is_some() {
            Repaint::Overlay
        } else {
            Repaint::None
        }
    }

    fn pointer_move(&mut self, sample: &PointerSample) -> Repaint {
        self.advance_clock(sample.time_ms);
        match self.capture.extend(sample, &mut self.viewport) {
            MoveOutcome::Ignored => Repaint::None,
            MoveOutcome::StrokeExtended => Repaint::Overlay,
            MoveOutcome::Panned => Repaint::Full,
        }
    }

    fn pointer_up(&mut self, sample: &PointerSample) -> Repaint {
        self.advance_clock(sample.time_ms);
        match self.capture.finish(sample.pointer_id) {
            None => Repaint::None,
            Some(CaptureOutcome::PanEnded) => Repaint::None,
            // The preview has to disappear.
            Some(CaptureOutcome::Discard) => Repaint::Full,
            Some(CaptureOutcome::Commit(stroke)) => {
                self.commit_stroke(stroke);
                Repaint::Full
            }
            Some(CaptureOutcome::Erase { path, size }) => {
                self.erase(&path, size);
                Repaint::Full
            }
        }
    }

    fn commit_stroke(&mut self, stroke: Stroke) {
        log::debug!(
            "Committed {:?} stroke with {} points",
            stroke.tool(),
            stroke.points().len()
        );
        self.content.add_stroke(Arc::new(stroke.clone()));
        self.record_mutation(CanvasEvent::StrokeCommitted(stroke));
    }

    fn erase(&mut self, path: &[StrokePoint], size: f32) {
        let removed = self.eraser.erase(&mut self.content, path, size);
        if removed > 0 {
            self.record_mutation(CanvasEvent::StrokesErased(removed));
        }
    }

    /// Snapshot, notify, then save, after every committed change.
    fn record_mutation(&mut self, event: CanvasEvent) {
        self.history.snapshot(self.content.share_strokes());
        self.events.emit(&event);
        self.request_save();
    }

    fn request_save(&mut self) {
        if let Some(status) = self.persistence.request_save(self.content.clone(), self.clock_ms) {
            self.events.emit(&CanvasEvent::SaveStatusChanged(status));
        }
    }

    fn apply_shortcut(&mut self, shortcut: Shortcut) -> Repaint {
        match shortcut {
            Shortcut::SelectTool(tool) => {
                self.set_tool(tool);
                Repaint::None
            }
            Shortcut::Undo => self.undo(),
            Shortcut::Redo => self.redo(),
            Shortcut::ZoomIn => self.zoom_in(),
            Shortcut::ZoomOut => self.zoom_out(),
            Shortcut::ResetView => self.reset_view(),
        }
    }

    // --- Edits ----------------------------------------------------------

    pub fn undo(&mut self) -> Repaint {
        match self.history.undo() {
            Some(strokes) => {
                self.content.replace_strokes(strokes);
                log::debug!("Undo to {} strokes", self.content.len());
                self.request_save();
                Repaint::Full
            }
            None => Repaint::None,
        }
    }

    pub fn redo(&mut self) -> Repaint {
        match self.history.redo() {
            Some(strokes) => {
                self.content.replace_strokes(strokes);
                log::debug!("Redo to {} strokes", self.content.len());
                self.request_save();
                Repaint::Full
            }
            None => Repaint::None,
        }
    }

    /// Removes every stroke as a single undoable step.
    pub fn clear(&mut self) -> Repaint {
        let removed = self.content.clear();
        if removed == 0 {
            return Repaint::None;
        }
        self.record_mutation(CanvasEvent::StrokesErased(removed));
        Repaint::Full
    }

    // --- View -----------------------------------------------------------

    pub fn zoom_in(&mut self) -> Repaint {
        self.zoom_by(self.settings.zoom_step)
    }

    pub fn zoom_out(&mut self) -> Repaint {
        self.zoom_by(-self.settings.zoom_step)
    }

    pub fn zoom_by(&mut self, delta: f32) -> Repaint {
        let before = self.viewport;
        self.viewport.zoom_by(delta);
        if self.viewport == before {
            Repaint::None
        } else {
            Repaint::Full
        }
    }

    pub fn reset_view(&mut self) -> Repaint {
        let before = self.viewport;
        self.viewport.reset();
        if self.viewport == before {
            Repaint::None
        } else {
            Repaint::Full
        }
    }

    // --- Rendering ------------------------------------------------------

    /// Full repaint: committed strokes and the in-progress stroke on top.
    pub fn render(&self, surface: &mut dyn Surface) -> bool {
        let preview = self.capture.preview();
        self.renderer
            .render(surface, &self.content, &self.viewport, preview.as_ref())
    }

    /// Repaints committed strokes only, e.g. into a cached background.
    pub fn render_committed(&self, surface: &mut dyn Surface) -> bool {
        self.renderer.render(surface, &self.content, &self.viewport, None)
    }

    /// Paints the in-progress stroke over the surface's current pixels.
    pub fn render_overlay(&self, surface: &mut dyn Surface) -> bool {
        match self.capture.preview() {
            Some(stroke) => self.renderer.render_overlay(surface, &self.viewport, &stroke),
            None => true,
        }
    }

    // --- Saving ---------------------------------------------------------

    /// Drives debounced saves. Returns true if the save status changed.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        self.advance_clock(now_ms);
        let changed = self.persistence.poll(now_ms);
        self.notify_status(changed)
    }

    /// Sends any scheduled save now, e.g. before the page closes.
    pub fn flush(&mut self) -> bool {
        let changed = self.persistence.flush();
        self.notify_status(changed)
    }

    fn notify_status(&mut self, changed: Option<SaveStatus>) -> bool {
        match changed {
            Some(status) => {
                self.events.emit(&CanvasEvent::SaveStatusChanged(status));
                true
            }
            None => false,
        }
    }

    fn advance_clock(&mut self, now_ms: f64) {
        if now_ms.is_finite() && now_ms > self.clock_ms {
            self.clock_ms = now_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PointerId;
    use crate::persistence::MemoryBackend;
    use crate::renderer::RasterSurface;
    use egui::pos2;

    fn canvas(backend: &MemoryBackend) -> InkCanvas {
        InkCanvas::new(
            CanvasConfig::default(),
            PageId::new(),
            DrawingContent::new(),
            Box::new(backend.clone()),
        )
    }

    fn sample(id: PointerId, x: f32, y: f32, t: f64) -> PointerSample {
        PointerSample::new(id, pos2(x, y), t)
    }

    fn draw(canvas: &mut InkCanvas, points: &[(f32, f32)], start_ms: f64) {
        let mut t = start_ms;
        let (x, y) = points[0];
        canvas.handle_event(&InputEvent::PointerDown(sample(0, x, y, t)));
        for &(x, y) in &points[1..] {
            t += 16.0;
            canvas.handle_event(&InputEvent::PointerMove(sample(0, x, y, t)));
        }
        canvas.handle_event(&InputEvent::PointerUp(sample(0, x, y, t)));
    }

    #[test]
    fn test_repaint_kinds_follow_gesture() {
        let backend = MemoryBackend::new();
        let mut canvas = canvas(&backend);
        assert_eq!(
            canvas.handle_event(&InputEvent::PointerDown(sample(0, 0.0, 0.0, 0.0))),
            Repaint::Overlay
        );
        assert_eq!(
            canvas.handle_event(&InputEvent::PointerMove(sample(0, 5.0, 5.0, 16.0))),
            Repaint::Overlay
        );
        assert_eq!(
            canvas.handle_event(&InputEvent::PointerUp(sample(0, 5.0, 5.0, 32.0))),
            Repaint::Full
        );
        assert_eq!(canvas.content().len(), 1);
    }

    #[test]
    fn test_commit_snapshots_then_saves() {
        let backend = MemoryBackend::new();
        let mut canvas = canvas(&backend);
        draw(&mut canvas, &[(0.0, 0.0), (10.0, 10.0)], 0.0);

        assert!(canvas.can_undo());
        assert_eq!(canvas.save_status(), SaveStatus::Saving);
        assert!(canvas.poll(10_000.0));
        assert_eq!(canvas.save_status(), SaveStatus::Saved);
        assert_eq!(backend.last_saved().map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_undo_restores_previous_strokes() {
        let backend = MemoryBackend::new();
        let mut canvas = canvas(&backend);
        draw(&mut canvas, &[(0.0, 0.0), (10.0, 10.0)], 0.0);
        draw(&mut canvas, &[(0.0, 20.0), (10.0, 20.0)], 100.0);

        assert_eq!(canvas.undo(), Repaint::Full);
        assert_eq!(canvas.content().len(), 1);
        assert_eq!(canvas.redo(), Repaint::Full);
        assert_eq!(canvas.content().len(), 2);
        assert_eq!(canvas.redo(), Repaint::None);
    }

    #[test]
    fn test_wheel_zoom_uses_speed_and_clamps() {
        let backend = MemoryBackend::new();
        let mut canvas = canvas(&backend);
        assert_eq!(canvas.handle_event(&InputEvent::Zoom { delta: 100.0 }), Repaint::Full);
        assert!((canvas.viewport().zoom() - 1.2).abs() < 1e-6);

        canvas.handle_event(&InputEvent::Zoom { delta: 1_000_000.0 });
        assert_eq!(canvas.viewport().zoom(), 5.0);
        assert_eq!(canvas.handle_event(&InputEvent::Zoom { delta: 10.0 }), Repaint::None);
    }

    #[test]
    fn test_tool_shortcut_applies_to_next_gesture_only() {
        let backend = MemoryBackend::new();
        let mut canvas = canvas(&backend);
        canvas.handle_event(&InputEvent::PointerDown(sample(0, 0.0, 0.0, 0.0)));
        canvas.handle_event(&InputEvent::Shortcut(Shortcut::SelectTool(Tool::Highlighter)));
        canvas.handle_event(&InputEvent::PointerMove(sample(0, 9.0, 0.0, 16.0)));
        canvas.handle_event(&InputEvent::PointerUp(sample(0, 9.0, 0.0, 32.0)));

        assert_eq!(canvas.brush().tool, Tool::Highlighter);
        assert_eq!(canvas.content().strokes()[0].tool(), crate::stroke::StrokeTool::Pen);
    }

    #[test]
    fn test_render_shows_in_progress_stroke() {
        let backend = MemoryBackend::new();
        let mut canvas = canvas(&backend);
        canvas.set_size(10.0);
        canvas.handle_event(&InputEvent::PointerDown(sample(0, 10.0, 20.0, 0.0)));
        canvas.handle_event(&InputEvent::PointerMove(sample(0, 60.0, 20.0, 100.0)));

        let mut surface = RasterSurface::new(80, 40);
        assert!(canvas.render_committed(&mut surface));
        assert_eq!(surface.pixel(35, 20).map(|p| p[3]), Some(0));
        assert!(canvas.render_overlay(&mut surface));
        assert_eq!(surface.pixel(35, 20).map(|p| p[3]), Some(255));
    }

    #[test]
    fn test_clear_is_one_undoable_step() {
        let backend = MemoryBackend::new();
        let mut canvas = canvas(&backend);
        draw(&mut canvas, &[(0.0, 0.0), (10.0, 10.0)], 0.0);
        draw(&mut canvas, &[(0.0, 20.0), (10.0, 20.0)], 100.0);

        assert_eq!(canvas.clear(), Repaint::Full);
        assert!(canvas.content().is_empty());
        assert_eq!(canvas.clear(), Repaint::None);
        canvas.undo();
        assert_eq!(canvas.content().len(), 2);
    }

    #[test]
    fn test_invalid_size_is_ignored() {
        let backend = MemoryBackend::new();
        let mut canvas = canvas(&backend);
        canvas.set_size(f32::NAN);
        canvas.set_size(-2.0);
        assert_eq!(canvas.brush().size, 8.0);
    }
}
