mod bus;

pub use bus::EventBus;

use crate::persistence::SaveStatus;
use crate::stroke::Stroke;

/// Things that happened to a drawing that the surrounding UI may care about.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    StrokeCommitted(Stroke),
    StrokesErased(usize),
    SaveStatusChanged(SaveStatus),
}

/// Receives canvas notifications. Every method defaults to doing nothing.
pub trait CanvasObserver {
    fn on_stroke_committed(&mut self, _stroke: &Stroke) {}

    fn on_strokes_erased(&mut self, _count: usize) {}

    fn on_save_status_changed(&mut self, _status: SaveStatus) {}
}
