use egui::{Color32, Rect, TextureHandle, TextureOptions, pos2};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{BrushSettings, CanvasConfig};
use crate::document::PageId;
use crate::engine::{InkCanvas, Repaint};
use crate::input::InputHandler;
use crate::panels::{central_panel, tools_panel};
use crate::persistence::FileBackend;
use crate::renderer::RasterSurface;
use crate::util::time::now_ms;

const SETTINGS_FILE: &str = "settings.json";

/// What the app remembers between runs through eframe storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
struct StoredState {
    page: PageId,
    brush: Option<BrushSettings>,
}

/// Desktop shell around one [`InkCanvas`].
pub struct InkApp {
    canvas: InkCanvas,
    input: InputHandler,
    // Committed strokes only; the in-progress stroke is layered on a copy.
    background: RasterSurface,
    frame: RasterSurface,
    texture: Option<TextureHandle>,
    pending: Repaint,
}

impl InkApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, data_dir: PathBuf) -> Self {
        let stored: StoredState = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        let mut config = CanvasConfig::load(&data_dir.join(SETTINGS_FILE)).unwrap_or_else(|err| {
            log::warn!("Ignoring settings file: {err}");
            CanvasConfig::default()
        });
        if let Some(brush) = stored.brush {
            config.brush = brush;
        }

        let backend = FileBackend::new(data_dir);
        let content = backend.load(&stored.page);
        let canvas = InkCanvas::new(config, stored.page, content, Box::new(backend));
        Self::with_canvas(canvas)
    }

    pub fn with_canvas(canvas: InkCanvas) -> Self {
        Self {
            canvas,
            input: InputHandler::new(Rect::NOTHING),
            background: RasterSurface::new(0, 0),
            frame: RasterSurface::new(0, 0),
            texture: None,
            pending: Repaint::Full,
        }
    }

    pub fn canvas(&self) -> &InkCanvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut InkCanvas {
        &mut self.canvas
    }

    /// Remembers that the next paint has to redraw at least `repaint`.
    pub fn queue_repaint(&mut self, repaint: Repaint) {
        self.pending = self.pending.merge(repaint);
    }

    pub fn handle_input(&mut self, ctx: &egui::Context, canvas_rect: Rect) {
        self.input.set_canvas_rect(canvas_rect);
        let events = self.input.process_input(ctx);
        let repaint = self.canvas.handle_events(&events);
        self.queue_repaint(repaint);
    }

    /// Brings the canvas texture up to date and draws it into `rect`.
    pub fn paint(&mut self, ctx: &egui::Context, painter: &egui::Painter, rect: Rect) {
        let width = rect.width().max(0.0).round() as u32;
        let height = rect.height().max(0.0).round() as u32;
        if width == 0 || height == 0 {
            return;
        }
        if self.background.resize(width, height) {
            self.frame.resize(width, height);
            self.queue_repaint(Repaint::Full);
        }

        let repainted = match std::mem::take(&mut self.pending) {
            Repaint::None => false,
            Repaint::Full => {
                self.canvas.render_committed(&mut self.background);
                self.compose_overlay();
                true
            }
            Repaint::Overlay => {
                self.compose_overlay();
                true
            }
        };

        if repainted || self.texture.is_none() {
            let image = self.frame.to_color_image();
            if let Some(texture) = &mut self.texture {
                texture.set(image, TextureOptions::LINEAR);
            } else {
                self.texture = Some(ctx.load_texture("inkpad-canvas", image, TextureOptions::LINEAR));
            }
        }

        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }
    }

    fn compose_overlay(&mut self) {
        self.frame.copy_from(&self.background);
        self.canvas.render_overlay(&mut self.frame);
    }
}

/// How long the app may sleep before the canvas needs another frame.
/// `None` when nothing is pending.
fn next_wakeup(canvas: &InkCanvas, status_changed: bool, now_ms: f64) -> Option<Duration> {
    if status_changed {
        return Some(Duration::ZERO);
    }
    match canvas.next_save_deadline() {
        Some(deadline) => Some(Duration::from_millis((deadline - now_ms).max(0.0) as u64)),
        // A save is running; keep polling until it lands.
        None if canvas.is_saving() => Some(Duration::ZERO),
        None => None,
    }
}

impl eframe::App for InkApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let stored = StoredState {
            page: self.canvas.page(),
            brush: Some(self.canvas.brush().clone()),
        };
        eframe::set_value(storage, eframe::APP_KEY, &stored);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll first so the panel shows the status this frame produced.
        self.canvas.poll(now_ms());

        tools_panel(self, ctx);
        central_panel(self, ctx);

        // Edits in this frame may have scheduled a save or finished one.
        let now = now_ms();
        let status_changed = self.canvas.poll(now);
        if let Some(wait) = next_wakeup(&self.canvas, status_changed, now) {
            ctx.request_repaint_after(wait);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.canvas.flush();
    }
}
