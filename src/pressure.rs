use egui::Pos2;

use crate::stroke::NEUTRAL_PRESSURE;

/// Derives a pressure value from pointer velocity when the device reports none.
///
/// Faster movement gives a lower value, so quick flicks draw thinner lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureModel {
    /// Velocity (logical px per ms) at which the simulated pressure halves.
    velocity_scale: f32,
}

impl Default for PressureModel {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl PressureModel {
    pub fn new(velocity_scale: f32) -> Self {
        Self {
            velocity_scale: if velocity_scale.is_finite() && velocity_scale > 0.0 {
                velocity_scale
            } else {
                0.5
            },
        }
    }

    /// Pressure for the newest point in `points`, captured at `times_ms`.
    pub fn simulate(&self, points: &[Pos2], times_ms: &[f64]) -> f32 {
        let n = points.len().min(times_ms.len());
        if n < 2 {
            return NEUTRAL_PRESSURE;
        }
        let elapsed = (times_ms[n - 1] - times_ms[n - 2]) as f32;
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return NEUTRAL_PRESSURE;
        }
        let velocity = points[n - 1].distance(points[n - 2]) / elapsed;
        let pressure = 1.0 / (1.0 + velocity / self.velocity_scale);
        if pressure.is_finite() {
            pressure.clamp(0.0, 1.0)
        } else {
            NEUTRAL_PRESSURE
        }
    }

    /// Hardware pressure if the device reported a usable value, otherwise
    /// a simulated one. A reading of exactly zero counts as "no pressure".
    pub fn resolve(&self, hardware: Option<f32>, points: &[Pos2], times_ms: &[f64]) -> f32 {
        match hardware {
            Some(p) if p.is_finite() && p > 0.0 => p.clamp(0.0, 1.0),
            _ => self.simulate(points, times_ms),
        }
    }
}
