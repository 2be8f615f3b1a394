use egui::{Color32, Pos2};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::renderer::outline::OutlineOptions;

/// Pressure used whenever no better estimate exists.
pub const NEUTRAL_PRESSURE: f32 = 0.5;

/// A single captured sample in logical canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
    #[serde(default = "neutral_pressure")]
    pub pressure: f32,
}

fn neutral_pressure() -> f32 {
    NEUTRAL_PRESSURE
}

impl StrokePoint {
    pub fn new(x: f32, y: f32, pressure: f32) -> Self {
        Self {
            x,
            y,
            pressure: pressure.clamp(0.0, 1.0),
        }
    }

    pub fn pos(&self) -> Pos2 {
        Pos2::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.pressure.is_finite()
    }
}

/// The tool a stroke was drawn with. Fixed when the stroke is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeTool {
    Pen,
    Highlighter,
    Eraser,
}

// Immutable stroke for sharing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    points: Vec<StrokePoint>,
    #[serde(with = "hex_color")]
    color: Color32,
    size: f32,
    #[serde(default = "full_opacity")]
    opacity: f32,
    tool: StrokeTool,
    #[serde(default)]
    outline: OutlineOptions,
}

fn full_opacity() -> f32 {
    1.0
}

// Define a reference-counted type alias for Stroke
pub type StrokeRef = Arc<Stroke>;

impl Stroke {
    pub fn new(
        tool: StrokeTool,
        color: Color32,
        size: f32,
        opacity: f32,
        points: Vec<StrokePoint>,
    ) -> Self {
        Self {
            points,
            color,
            size,
            opacity: opacity.clamp(0.0, 1.0),
            tool,
            outline: OutlineOptions::default(),
        }
    }

    pub fn with_outline(mut self, outline: OutlineOptions) -> Self {
        self.outline = outline;
        self
    }

    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn tool(&self) -> StrokeTool {
        self.tool
    }

    pub fn outline(&self) -> &OutlineOptions {
        &self.outline
    }

    /// Whether this stroke may live in a drawing's stroke list.
    pub fn is_committable(&self) -> bool {
        match self.tool {
            StrokeTool::Pen | StrokeTool::Highlighter => self.points.len() >= 2,
            StrokeTool::Eraser => false,
        }
    }

    /// Clamps loaded values into their valid ranges. Returns `None` when the
    /// stroke cannot be repaired.
    pub(crate) fn sanitized(mut self) -> Option<Self> {
        if !self.is_committable()
            || !self.size.is_finite()
            || self.size <= 0.0
            || self.points.iter().any(|p| !p.is_finite())
        {
            return None;
        }
        for point in &mut self.points {
            point.pressure = point.pressure.clamp(0.0, 1.0);
        }
        self.opacity = if self.opacity.is_finite() {
            self.opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Some(self)
    }
}

/// The stroke currently being captured.
///
/// Cosmetic fields stay editable until the stroke is committed; the tool is not.
#[derive(Debug, Clone)]
pub struct ActiveStroke {
    points: Vec<StrokePoint>,
    // Capture time of each point, in milliseconds.
    timestamps: Vec<f64>,
    color: Color32,
    size: f32,
    opacity: f32,
    tool: StrokeTool,
    outline: OutlineOptions,
}

impl ActiveStroke {
    pub fn new(
        tool: StrokeTool,
        color: Color32,
        size: f32,
        opacity: f32,
        outline: OutlineOptions,
    ) -> Self {
        Self {
            points: Vec::new(),
            timestamps: Vec::new(),
            color,
            size,
            opacity: opacity.clamp(0.0, 1.0),
            tool,
            outline,
        }
    }

    pub fn add_point(&mut self, point: StrokePoint, time_ms: f64) {
        self.points.push(point);
        self.timestamps.push(time_ms);
    }

    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    /// Position and time of the newest point.
    pub fn last_sample(&self) -> Option<(Pos2, f64)> {
        let point = self.points.last()?;
        let time_ms = *self.timestamps.last()?;
        Some((point.pos(), time_ms))
    }

    pub fn tool(&self) -> StrokeTool {
        self.tool
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn set_color(&mut self, color: Color32) {
        self.color = color;
    }

    pub fn set_size(&mut self, size: f32) {
        self.size = size;
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn set_outline(&mut self, outline: OutlineOptions) {
        self.outline = outline;
    }

    /// Snapshot of the stroke as it currently looks, for the preview overlay.
    pub fn to_stroke(&self) -> Stroke {
        Stroke::new(
            self.tool,
            self.color,
            self.size,
            self.opacity,
            self.points.clone(),
        )
        .with_outline(self.outline.clone())
    }

    pub fn into_stroke(self) -> Stroke {
        Stroke::new(self.tool, self.color, self.size, self.opacity, self.points)
            .with_outline(self.outline)
    }
}

/// `#rrggbb` (de)serialization for [`Color32`].
pub mod hex_color {
    use egui::Color32;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn to_hex(color: Color32) -> String {
        format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
    }

    /// Accepts `#rrggbb` and `#rgb`, with or without the leading `#`.
    pub fn parse(text: &str) -> Option<Color32> {
        let digits = text.trim().trim_start_matches('#');
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            6 => Some(Color32::from_rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let short = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
                Some(Color32::from_rgb(short(0)?, short(1)?, short(2)?))
            }
            _ => None,
        }
    }

    pub fn serialize<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).ok_or_else(|| de::Error::custom(format!("invalid color `{text}`")))
    }
}
