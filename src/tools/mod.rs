use serde::{Deserialize, Serialize};

use crate::stroke::StrokeTool;

mod capture;
pub use capture::{CaptureOutcome, CaptureState, MoveOutcome, StrokeCapture};

mod eraser;
pub use eraser::EraserEngine;

/// Tools selectable from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pen,
    Highlighter,
    Eraser,
    Pan,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Pen, Tool::Highlighter, Tool::Eraser, Tool::Pan];

    /// The stroke variant a gesture with this tool produces, if any.
    pub fn stroke_tool(self) -> Option<StrokeTool> {
        match self {
            Tool::Pen => Some(StrokeTool::Pen),
            Tool::Highlighter => Some(StrokeTool::Highlighter),
            Tool::Eraser => Some(StrokeTool::Eraser),
            Tool::Pan => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tool::Pen => "Pen",
            Tool::Highlighter => "Highlighter",
            Tool::Eraser => "Eraser",
            Tool::Pan => "Pan",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Tool::Pen => "🖊",
            Tool::Highlighter => "🖍",
            Tool::Eraser => "⌫",
            Tool::Pan => "✋",
        }
    }
}
