#![allow(dead_code)]

use inkpad::input::PointerId;
use inkpad::{
    CanvasConfig, CanvasObserver, DrawingContent, InkCanvas, InputEvent, MemoryBackend, PageId,
    PointerSample, SaveStatus, Stroke,
};
use egui::pos2;
use parking_lot::Mutex;
use std::sync::Arc;

pub fn canvas_with(backend: &MemoryBackend, config: CanvasConfig) -> InkCanvas {
    InkCanvas::new(config, PageId::new(), DrawingContent::new(), Box::new(backend.clone()))
}

pub fn canvas(backend: &MemoryBackend) -> InkCanvas {
    canvas_with(backend, CanvasConfig::default())
}

pub fn sample(id: PointerId, x: f32, y: f32, t: f64) -> PointerSample {
    PointerSample::new(id, pos2(x, y), t)
}

/// Drags pointer 0 through `points` in screen space, 16 ms apart.
pub fn drag(canvas: &mut InkCanvas, points: &[(f32, f32)], start_ms: f64) -> f64 {
    let mut t = start_ms;
    let (x, y) = points[0];
    canvas.handle_event(&InputEvent::PointerDown(sample(0, x, y, t)));
    let mut last = (x, y);
    for &(x, y) in &points[1..] {
        t += 16.0;
        canvas.handle_event(&InputEvent::PointerMove(sample(0, x, y, t)));
        last = (x, y);
    }
    canvas.handle_event(&InputEvent::PointerUp(sample(0, last.0, last.1, t)));
    t
}

/// A horizontal drag from x = 0 to x = 100 at height `y`.
pub fn horizontal(canvas: &mut InkCanvas, y: f32, start_ms: f64) -> f64 {
    let points: Vec<(f32, f32)> = (0..=10).map(|i| (i as f32 * 10.0, y)).collect();
    drag(canvas, &points, start_ms)
}

/// Records every observer callback as a readable line.
#[derive(Clone, Default)]
pub struct Log(pub Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

impl CanvasObserver for Log {
    fn on_stroke_committed(&mut self, stroke: &Stroke) {
        self.0.lock().push(format!("committed {}", stroke.points().len()));
    }

    fn on_strokes_erased(&mut self, count: usize) {
        self.0.lock().push(format!("erased {count}"));
    }

    fn on_save_status_changed(&mut self, status: SaveStatus) {
        self.0.lock().push(format!("status {status:?}"));
    }
}
