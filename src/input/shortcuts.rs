use egui::{Key, Modifiers};

use crate::tools::Tool;

/// Keyboard actions the canvas understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    SelectTool(Tool),
    Undo,
    Redo,
    ZoomIn,
    ZoomOut,
    ResetView,
}

/// Maps a key press to a canvas action. `command` is Ctrl, or Cmd on macOS.
pub fn shortcut_for(key: Key, modifiers: Modifiers) -> Option<Shortcut> {
    if modifiers.alt {
        return None;
    }
    if modifiers.command {
        return match key {
            Key::Z if modifiers.shift => Some(Shortcut::Redo),
            Key::Z => Some(Shortcut::Undo),
            Key::Y => Some(Shortcut::Redo),
            Key::Equals | Key::Plus => Some(Shortcut::ZoomIn),
            Key::Minus => Some(Shortcut::ZoomOut),
            Key::Num0 => Some(Shortcut::ResetView),
            _ => None,
        };
    }
    if modifiers.ctrl || modifiers.mac_cmd {
        return None;
    }
    match key {
        Key::P => Some(Shortcut::SelectTool(Tool::Pen)),
        Key::H => Some(Shortcut::SelectTool(Tool::Highlighter)),
        Key::E => Some(Shortcut::SelectTool(Tool::Eraser)),
        Key::V | Key::Space => Some(Shortcut::SelectTool(Tool::Pan)),
        _ => None,
    }
}
