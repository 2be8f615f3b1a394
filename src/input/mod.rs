use egui::{Context, Event, MouseWheelUnit, PointerButton, Pos2, Rect, TouchPhase};

use crate::util::time::now_ms;

mod shortcuts;
pub use shortcuts::{Shortcut, shortcut_for};

/// Identifies one pointing device for the duration of a gesture.
pub type PointerId = u64;

/// The mouse. Touch and stylus contacts use their touch id plus one.
pub const MOUSE_POINTER_ID: PointerId = 0;

// Approximate pixel size of one wheel "line" and one "page".
const POINTS_PER_LINE: f32 = 50.0;
const POINTS_PER_PAGE: f32 = 400.0;

/// One pointer sample in canvas-local screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub pointer_id: PointerId,
    pub position: Pos2,
    /// Hardware pressure, if the device reports any.
    pub pressure: Option<f32>,
    pub time_ms: f64,
}

impl PointerSample {
    pub fn new(pointer_id: PointerId, position: Pos2, time_ms: f64) -> Self {
        Self {
            pointer_id,
            position,
            pressure: None,
            time_ms,
        }
    }

    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = Some(pressure);
        self
    }
}

/// Represents different types of input events the canvas reacts to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(PointerSample),
    PointerMove(PointerSample),
    PointerUp(PointerSample),
    PointerCancel(PointerSample),
    /// Modifier-gated wheel, in points. Positive zooms in.
    Zoom { delta: f32 },
    Shortcut(Shortcut),
}

/// Handles converting raw egui input into canvas [`InputEvent`]s
#[derive(Debug)]
pub struct InputHandler {
    canvas_rect: Rect,
    mouse_down: bool,
}

impl InputHandler {
    pub fn new(canvas_rect: Rect) -> Self {
        Self {
            canvas_rect,
            mouse_down: false,
        }
    }

    /// Update the canvas rectangle (e.g. if window is resized)
    pub fn set_canvas_rect(&mut self, rect: Rect) {
        self.canvas_rect = rect;
    }

    fn local(&self, pos: Pos2) -> Pos2 {
        pos - self.canvas_rect.min.to_vec2()
    }

    /// Process raw egui input and generate our InputEvents. Every event of
    /// one frame is stamped with the same wall-clock time.
    pub fn process_input(&mut self, ctx: &Context) -> Vec<InputEvent> {
        let events = ctx.input(|input| input.raw.events.clone());
        let time_ms = now_ms();
        events
            .iter()
            .filter_map(|event| self.translate(event, time_ms))
            .collect()
    }

    /// Translates a single egui event. Pointer presses outside the canvas
    /// are ignored; moves and releases are forwarded while the mouse is down.
    pub fn translate(&mut self, event: &Event, time_ms: f64) -> Option<InputEvent> {
        match event {
            Event::PointerButton {
                pos,
                button: PointerButton::Primary,
                pressed,
                ..
            } => {
                let sample = PointerSample::new(MOUSE_POINTER_ID, self.local(*pos), time_ms);
                if *pressed {
                    if !self.canvas_rect.contains(*pos) {
                        return None;
                    }
                    self.mouse_down = true;
                    Some(InputEvent::PointerDown(sample))
                } else if self.mouse_down {
                    self.mouse_down = false;
                    Some(InputEvent::PointerUp(sample))
                } else {
                    None
                }
            }
            Event::PointerMoved(pos) if self.mouse_down => Some(InputEvent::PointerMove(
                PointerSample::new(MOUSE_POINTER_ID, self.local(*pos), time_ms),
            )),
            Event::PointerGone if self.mouse_down => {
                self.mouse_down = false;
                Some(InputEvent::PointerCancel(PointerSample::new(
                    MOUSE_POINTER_ID,
                    Pos2::ZERO,
                    time_ms,
                )))
            }
            Event::Touch {
                id,
                phase,
                pos,
                force,
                ..
            } => {
                let mut sample = PointerSample::new(id.0.wrapping_add(1), self.local(*pos), time_ms);
                sample.pressure = *force;
                match phase {
                    TouchPhase::Start if self.canvas_rect.contains(*pos) => {
                        Some(InputEvent::PointerDown(sample))
                    }
                    TouchPhase::Start => None,
                    TouchPhase::Move => Some(InputEvent::PointerMove(sample)),
                    TouchPhase::End => Some(InputEvent::PointerUp(sample)),
                    TouchPhase::Cancel => Some(InputEvent::PointerCancel(sample)),
                }
            }
            Event::MouseWheel {
                unit,
                delta,
                modifiers,
            } if modifiers.command || modifiers.ctrl => {
                let scale = match unit {
                    MouseWheelUnit::Point => 1.0,
                    MouseWheelUnit::Line => POINTS_PER_LINE,
                    MouseWheelUnit::Page => POINTS_PER_PAGE,
                };
                Some(InputEvent::Zoom {
                    delta: delta.y * scale,
                })
            }
            Event::Key {
                key,
                pressed: true,
                repeat: false,
                modifiers,
                ..
            } => shortcut_for(*key, *modifiers).map(InputEvent::Shortcut),
            _ => None,
        }
    }
}
