//! Variable-width outline generation.
//!
//! Turns a point-and-pressure sequence into a closed polygon that can be
//! filled in one pass. Streamlining pulls each sample toward the previous one,
//! pressure (real or simulated from spacing) drives the radius, and tapers and
//! caps shape the two ends.

use egui::{Pos2, Vec2, pos2, vec2};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::stroke::StrokePoint;

const RATE_OF_PRESSURE_CHANGE: f32 = 0.275;
// Slightly more than a half turn so rotated caps close without a seam.
const FIXED_PI: f32 = PI + 0.0001;
const START_CAP_SEGMENTS: usize = 13;
const END_CAP_SEGMENTS: usize = 29;
const CORNER_SEGMENTS: usize = 13;

/// Shaping parameters for the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineOptions {
    /// How much pressure affects the width, `-1..=1`. Negative values thicken
    /// light strokes instead of thinning them.
    pub thinning: f32,
    /// Minimum spacing between emitted outline points, as a fraction of size.
    pub smoothing: f32,
    /// How strongly samples are pulled toward the previous sample, `0..=1`.
    pub streamline: f32,
    pub simulate_pressure: bool,
    pub cap_start: bool,
    pub cap_end: bool,
    /// Distance over which the start narrows to a point. Zero disables it.
    pub taper_start: f32,
    pub taper_end: f32,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            thinning: 0.5,
            smoothing: 0.5,
            streamline: 0.5,
            simulate_pressure: true,
            cap_start: true,
            cap_end: true,
            taper_start: 0.0,
            taper_end: 0.0,
        }
    }
}

impl OutlineOptions {
    /// Clamps every parameter into its documented range.
    pub fn normalized(&self) -> Self {
        let finite_or = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };
        Self {
            thinning: finite_or(self.thinning, 0.5).clamp(-1.0, 1.0),
            smoothing: finite_or(self.smoothing, 0.5).clamp(0.0, 1.0),
            streamline: finite_or(self.streamline, 0.5).clamp(0.0, 1.0),
            simulate_pressure: self.simulate_pressure,
            cap_start: self.cap_start,
            cap_end: self.cap_end,
            taper_start: finite_or(self.taper_start, 0.0).max(0.0),
            taper_end: finite_or(self.taper_end, 0.0).max(0.0),
        }
    }
}

/// A streamlined input sample.
#[derive(Debug, Clone, Copy)]
struct OutlineSample {
    point: Pos2,
    pressure: f32,
    /// Unit vector pointing back toward the previous sample.
    vector: Vec2,
    distance: f32,
    running_length: f32,
}

/// Builds the closed outline polygon for `points` drawn at `size`.
///
/// Returns an empty polygon for fewer than two points or a non-positive size.
/// `complete` marks a finished stroke: its last sample is used as-is instead
/// of being streamlined.
pub fn stroke_outline(
    points: &[StrokePoint],
    size: f32,
    options: &OutlineOptions,
    complete: bool,
) -> Vec<Pos2> {
    if points.len() < 2 || !size.is_finite() || size <= 0.0 {
        return Vec::new();
    }
    let options = options.normalized();
    let samples = streamline_samples(points, size, options.streamline, complete);
    outline_from_samples(&samples, size, &options, complete)
}

fn streamline_samples(
    points: &[StrokePoint],
    size: f32,
    streamline: f32,
    complete: bool,
) -> Vec<OutlineSample> {
    let t = 0.15 + (1.0 - streamline) * 0.85;
    let input: Vec<(Pos2, f32)> = if points.len() == 2 && complete {
        let (a, b) = (points[0], points[1]);
        let mut expanded = vec![(a.pos(), a.pressure)];
        for step in 1..5 {
            let f = step as f32 / 4.0;
            expanded.push((a.pos().lerp(b.pos(), f), a.pressure + (b.pressure - a.pressure) * f));
        }
        expanded
    } else {
        points.iter().map(|p| (p.pos(), p.pressure)).collect()
    };

    let mut samples = vec![OutlineSample {
        point: input[0].0,
        pressure: input[0].1,
        vector: vec2(1.0, 1.0),
        distance: 0.0,
        running_length: 0.0,
    }];
    let mut reached_minimum_length = false;
    let mut running_length = 0.0;
    let last_index = input.len() - 1;

    for (i, &(raw, pressure)) in input.iter().enumerate().skip(1) {
        let prev = samples[samples.len() - 1];
        let point = if complete && i == last_index {
            raw
        } else {
            prev.point.lerp(raw, t)
        };
        if point == prev.point {
            continue;
        }
        let distance = point.distance(prev.point);
        running_length += distance;
        if i < last_index && !reached_minimum_length {
            if running_length < size {
                continue;
            }
            reached_minimum_length = true;
        }
        samples.push(OutlineSample {
            point,
            pressure,
            vector: (prev.point - point).normalized(),
            distance,
            running_length,
        });
    }

    samples[0].vector = samples.get(1).map_or(Vec2::ZERO, |s| s.vector);
    samples
}

fn stroke_radius(size: f32, thinning: f32, pressure: f32) -> f32 {
    size * (0.5 - thinning * (0.5 - pressure))
}

fn simulated_pressure(previous: f32, distance: f32, size: f32) -> f32 {
    let speed = (distance / size).min(1.0);
    let rest = (1.0 - speed).min(1.0);
    (previous + (rest - previous) * (speed * RATE_OF_PRESSURE_CHANGE)).min(1.0)
}

fn ease_out_quad(t: f32) -> f32 {
    t * (2.0 - t)
}

fn ease_out_cubic(t: f32) -> f32 {
    let t = t - 1.0;
    t * t * t + 1.0
}

/// Perpendicular `[y, -x]`.
fn perpendicular(v: Vec2) -> Vec2 {
    vec2(v.y, -v.x)
}

fn rotate_around(point: Pos2, center: Pos2, angle: f32) -> Pos2 {
    let (sin, cos) = angle.sin_cos();
    let d = point - center;
    pos2(
        d.x * cos - d.y * sin + center.x,
        d.x * sin + d.y * cos + center.y,
    )
}

fn outline_from_samples(
    samples: &[OutlineSample],
    size: f32,
    options: &OutlineOptions,
    complete: bool,
) -> Vec<Pos2> {
    let len = samples.len();
    let last = samples[len - 1];
    let total_length = last.running_length;
    let taper_start = options.taper_start;
    let taper_end = options.taper_end;
    let min_distance = (size * options.smoothing).powi(2);

    let mut left: Vec<Pos2> = Vec::with_capacity(len * 2);
    let mut right: Vec<Pos2> = Vec::with_capacity(len * 2);

    let mut prev_pressure = samples.iter().take(10).fold(samples[0].pressure, |acc, s| {
        let pressure = if options.simulate_pressure {
            simulated_pressure(acc, s.distance, size)
        } else {
            s.pressure
        };
        (acc + pressure) / 2.0
    });

    let mut radius = stroke_radius(size, options.thinning, last.pressure);
    let mut first_radius: Option<f32> = None;
    let mut prev_vector = samples[0].vector;
    let mut pl = samples[0].point;
    let mut pr = pl;
    let mut prev_was_sharp = false;

    for (i, sample) in samples.iter().enumerate() {
        let is_last = i == len - 1;
        // Skip the jittery tail just before the final sample.
        if !is_last && total_length - sample.running_length < 3.0 {
            continue;
        }

        let mut pressure = sample.pressure;
        if options.thinning != 0.0 {
            if options.simulate_pressure {
                pressure = simulated_pressure(prev_pressure, sample.distance, size);
            }
            radius = stroke_radius(size, options.thinning, pressure);
        } else {
            radius = size / 2.0;
        }
        if first_radius.is_none() {
            first_radius = Some(radius);
        }

        let start_taper = if sample.running_length < taper_start {
            ease_out_quad(sample.running_length / taper_start)
        } else {
            1.0
        };
        let remaining = total_length - sample.running_length;
        let end_taper = if remaining < taper_end {
            ease_out_cubic(remaining / taper_end)
        } else {
            1.0
        };
        radius = (radius * start_taper.min(end_taper)).max(0.01);

        let next_vector = if is_last {
            sample.vector
        } else {
            samples[i + 1].vector
        };
        let next_dot = if is_last { 1.0 } else { sample.vector.dot(next_vector) };
        let prev_dot = sample.vector.dot(prev_vector);

        let is_sharp = prev_dot < 0.0 && !prev_was_sharp;
        let next_is_sharp = next_dot < 0.0;

        if is_sharp || next_is_sharp {
            let offset = perpendicular(prev_vector) * radius;
            let mut tl = pl;
            let mut tr = pr;
            for step in 0..=CORNER_SEGMENTS {
                let t = step as f32 / CORNER_SEGMENTS as f32;
                tl = rotate_around(sample.point - offset, sample.point, FIXED_PI * t);
                left.push(tl);
                tr = rotate_around(sample.point + offset, sample.point, FIXED_PI * -t);
                right.push(tr);
            }
            pl = tl;
            pr = tr;
            if next_is_sharp {
                prev_was_sharp = true;
            }
            continue;
        }
        prev_was_sharp = false;

        if is_last {
            let offset = perpendicular(sample.vector) * radius;
            left.push(sample.point - offset);
            right.push(sample.point + offset);
            continue;
        }

        let blended = next_vector + (sample.vector - next_vector) * next_dot;
        let offset = perpendicular(blended) * radius;

        let tl = sample.point - offset;
        if i <= 1 || pl.distance_sq(tl) > min_distance {
            left.push(tl);
            pl = tl;
        }
        let tr = sample.point + offset;
        if i <= 1 || pr.distance_sq(tr) > min_distance {
            right.push(tr);
            pr = tr;
        }

        prev_pressure = pressure;
        prev_vector = sample.vector;
    }

    let first_point = samples[0].point;
    let last_point = if len > 1 {
        last.point
    } else {
        first_point + vec2(1.0, 1.0)
    };

    // Streamlining collapsed everything into a single sample: draw a dot.
    if len == 1 {
        if (taper_start > 0.0 || taper_end > 0.0) && !complete {
            return Vec::new();
        }
        let r = first_radius.unwrap_or(radius);
        let direction = perpendicular(first_point - last_point).normalized();
        let start = first_point - direction * r;
        return (1..=START_CAP_SEGMENTS)
            .map(|step| {
                let t = step as f32 / START_CAP_SEGMENTS as f32;
                rotate_around(start, first_point, FIXED_PI * 2.0 * t)
            })
            .collect();
    }

    if left.is_empty() || right.is_empty() {
        return Vec::new();
    }

    let mut start_cap = Vec::new();
    if taper_start > 0.0 {
        // Tapered start already narrows to a point.
    } else if options.cap_start {
        for step in 1..=START_CAP_SEGMENTS {
            let t = step as f32 / START_CAP_SEGMENTS as f32;
            start_cap.push(rotate_around(right[0], first_point, FIXED_PI * t));
        }
    } else {
        let corners = left[0] - right[0];
        let a = corners * 0.5;
        let b = corners * 0.51;
        start_cap.extend([first_point - a, first_point - b, first_point + b, first_point + a]);
    }

    let direction = perpendicular(-last.vector);
    let mut end_cap = Vec::new();
    if taper_end > 0.0 {
        end_cap.push(last_point);
    } else if options.cap_end {
        let start = last_point + direction * radius;
        for step in 1..END_CAP_SEGMENTS {
            let t = step as f32 / END_CAP_SEGMENTS as f32;
            end_cap.push(rotate_around(start, last_point, FIXED_PI * 3.0 * t));
        }
    } else {
        end_cap.extend([
            last_point + direction * radius,
            last_point + direction * (radius * 0.99),
            last_point - direction * (radius * 0.99),
            last_point - direction * radius,
        ]);
    }

    let mut outline = left;
    outline.extend(end_cap);
    outline.extend(right.into_iter().rev());
    outline.extend(start_cap);
    outline
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal(len: usize, step: f32, pressure: f32) -> Vec<StrokePoint> {
        (0..len)
            .map(|i| StrokePoint::new(i as f32 * step, 0.0, pressure))
            .collect()
    }

    fn bounds(points: &[Pos2]) -> egui::Rect {
        let mut rect = egui::Rect::NOTHING;
        for p in points {
            rect.extend_with(*p);
        }
        rect
    }

    #[test]
    fn test_needs_two_points() {
        let options = OutlineOptions::default();
        assert!(stroke_outline(&[], 8.0, &options, true).is_empty());
        assert!(stroke_outline(&horizontal(1, 1.0, 0.5), 8.0, &options, true).is_empty());
        assert!(stroke_outline(&horizontal(5, 4.0, 0.5), 0.0, &options, true).is_empty());
    }

    #[test]
    fn test_outline_surrounds_the_line() {
        let options = OutlineOptions {
            thinning: 0.0,
            ..OutlineOptions::default()
        };
        let outline = stroke_outline(&horizontal(30, 4.0, 0.5), 10.0, &options, true);
        assert!(outline.len() > 4);
        let rect = bounds(&outline);
        // Constant radius of size / 2 around a horizontal line.
        assert!(rect.min.y <= -4.9 && rect.min.y >= -5.1, "{rect:?}");
        assert!(rect.max.y >= 4.9 && rect.max.y <= 5.1, "{rect:?}");
        assert!(rect.min.x < 0.0, "round start cap extends behind the first point");
        assert!(rect.max.x > 116.0, "round end cap extends past the last point");
        assert!(outline.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_pressure_changes_width() {
        let options = OutlineOptions {
            thinning: 0.9,
            simulate_pressure: false,
            ..OutlineOptions::default()
        };
        let light = bounds(&stroke_outline(&horizontal(30, 4.0, 0.05), 10.0, &options, true));
        let heavy = bounds(&stroke_outline(&horizontal(30, 4.0, 1.0), 10.0, &options, true));
        assert!(heavy.height() > light.height() * 2.0, "{light:?} vs {heavy:?}");
    }

    #[test]
    fn test_negative_thinning_inverts_pressure_response() {
        let options = OutlineOptions {
            thinning: -0.5,
            simulate_pressure: false,
            ..OutlineOptions::default()
        };
        let light = bounds(&stroke_outline(&horizontal(30, 4.0, 0.1), 10.0, &options, true));
        let heavy = bounds(&stroke_outline(&horizontal(30, 4.0, 0.9), 10.0, &options, true));
        assert!(light.height() > heavy.height());
    }

    #[test]
    fn test_tapered_end_closes_at_last_point() {
        let options = OutlineOptions {
            thinning: 0.0,
            cap_end: false,
            taper_end: 40.0,
            ..OutlineOptions::default()
        };
        let points = horizontal(30, 4.0, 0.5);
        let outline = stroke_outline(&points, 10.0, &options, true);
        let last = points[points.len() - 1].pos();
        assert!(outline.iter().any(|p| *p == last));
    }

    #[test]
    fn test_reversal_produces_round_corner() {
        let mut points = horizontal(20, 5.0, 0.5);
        points.extend((0..20).rev().map(|i| StrokePoint::new(i as f32 * 5.0, 0.5, 0.5)));
        let outline = stroke_outline(&points, 8.0, &OutlineOptions::default(), true);
        assert!(!outline.is_empty());
        assert!(outline.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_two_point_tap_is_expanded() {
        let points = vec![StrokePoint::new(0.0, 0.0, 0.5), StrokePoint::new(20.0, 0.0, 0.5)];
        let outline = stroke_outline(&points, 6.0, &OutlineOptions::default(), true);
        assert!(outline.len() > 8);
    }

    #[test]
    fn test_normalized_clamps_ranges() {
        let options = OutlineOptions {
            thinning: 4.0,
            smoothing: -1.0,
            streamline: f32::NAN,
            taper_start: -3.0,
            ..OutlineOptions::default()
        }
        .normalized();
        assert_eq!(options.thinning, 1.0);
        assert_eq!(options.smoothing, 0.0);
        assert_eq!(options.streamline, 0.5);
        assert_eq!(options.taper_start, 0.0);
    }
}
