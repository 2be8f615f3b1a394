use egui::Color32;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::renderer::outline::OutlineOptions;
use crate::stroke::hex_color;
use crate::tools::Tool;

/// Brush and tool settings supplied by the surrounding UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old settings
pub struct BrushSettings {
    pub tool: Tool,
    #[serde(with = "hex_color")]
    pub color: Color32,
    pub size: f32,
    pub opacity: f32,
    pub thinning: f32,
    pub smoothing: f32,
    pub streamline: f32,
    pub simulate_pressure: bool,
    pub cap_start: bool,
    pub cap_end: bool,
    pub taper_start: f32,
    pub taper_end: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        let outline = OutlineOptions::default();
        Self {
            tool: Tool::Pen,
            color: Color32::BLACK,
            size: 8.0,
            opacity: 1.0,
            thinning: outline.thinning,
            smoothing: outline.smoothing,
            streamline: outline.streamline,
            simulate_pressure: outline.simulate_pressure,
            cap_start: outline.cap_start,
            cap_end: outline.cap_end,
            taper_start: outline.taper_start,
            taper_end: outline.taper_end,
        }
    }
}

impl BrushSettings {
    pub fn outline(&self) -> OutlineOptions {
        OutlineOptions {
            thinning: self.thinning,
            smoothing: self.smoothing,
            streamline: self.streamline,
            simulate_pressure: self.simulate_pressure,
            cap_start: self.cap_start,
            cap_end: self.cap_end,
            taper_start: self.taper_start,
            taper_end: self.taper_end,
        }
        .normalized()
    }

    pub fn set_outline(&mut self, outline: &OutlineOptions) {
        let outline = outline.normalized();
        self.thinning = outline.thinning;
        self.smoothing = outline.smoothing;
        self.streamline = outline.streamline;
        self.simulate_pressure = outline.simulate_pressure;
        self.cap_start = outline.cap_start;
        self.cap_end = outline.cap_end;
        self.taper_start = outline.taper_start;
        self.taper_end = outline.taper_end;
    }
}

/// Engine policy. Product defaults, overridable per deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Maximum number of history snapshots kept.
    pub history_depth: usize,
    /// Quiet period before a save is sent.
    pub save_debounce_ms: u64,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Zoom change per keyboard shortcut.
    pub zoom_step: f32,
    /// Zoom change per wheel point.
    pub wheel_zoom_speed: f32,
    /// Eraser radius as a multiple of the brush size.
    pub eraser_radius_factor: f32,
    pub highlighter_opacity: f32,
    pub highlighter_thinning: f32,
    /// Velocity (logical px per ms) at which simulated pressure halves.
    pub pressure_velocity_scale: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            history_depth: 50,
            save_debounce_ms: 1000,
            min_zoom: 0.5,
            max_zoom: 5.0,
            zoom_step: 0.1,
            wheel_zoom_speed: 0.002,
            eraser_radius_factor: 2.0,
            highlighter_opacity: 0.4,
            highlighter_thinning: -0.5,
            pressure_velocity_scale: 0.5,
        }
    }
}

impl EngineSettings {
    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });
        if !self.min_zoom.is_finite() || self.min_zoom <= 0.0 {
            return invalid("min_zoom", "must be finite and positive");
        }
        if !self.max_zoom.is_finite() || self.max_zoom < self.min_zoom {
            return invalid("max_zoom", "must be finite and at least min_zoom");
        }
        if !self.zoom_step.is_finite() || !self.wheel_zoom_speed.is_finite() {
            return invalid("zoom_step", "zoom steps must be finite");
        }
        if !self.eraser_radius_factor.is_finite() || self.eraser_radius_factor <= 0.0 {
            return invalid("eraser_radius_factor", "must be finite and positive");
        }
        if !(0.0..=1.0).contains(&self.highlighter_opacity) {
            return invalid("highlighter_opacity", "must be within 0..=1");
        }
        if !self.highlighter_thinning.is_finite() {
            return invalid("highlighter_thinning", "must be finite");
        }
        if !self.pressure_velocity_scale.is_finite() || self.pressure_velocity_scale <= 0.0 {
            return invalid("pressure_velocity_scale", "must be finite and positive");
        }
        Ok(())
    }
}

/// Everything an engine instance needs at construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub brush: BrushSettings,
    pub engine: EngineSettings,
}

impl CanvasConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Reads settings from `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}
