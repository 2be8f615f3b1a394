use egui::Pos2;

use crate::config::BrushSettings;
use crate::input::{PointerId, PointerSample};
use crate::pressure::PressureModel;
use crate::stroke::{ActiveStroke, Stroke, StrokePoint, StrokeTool};
use crate::viewport::Viewport;

/// Gesture state. At most one pointer is captured at a time.
#[derive(Debug, Clone, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Drawing {
        pointer_id: PointerId,
        stroke: ActiveStroke,
    },
    Panning {
        pointer_id: PointerId,
        last_pos: Pos2,
    },
}

/// What a finished gesture asks the engine to do.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// A pen or highlighter stroke with enough points to keep.
    Commit(Stroke),
    /// An eraser path to test against committed strokes.
    Erase { path: Vec<StrokePoint>, size: f32 },
    /// A tap or other gesture that leaves the drawing untouched.
    Discard,
    PanEnded,
}

/// How a pointer move changed what is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Ignored,
    StrokeExtended,
    Panned,
}

/// Pointer-event state machine that accumulates strokes and pans the view.
#[derive(Debug, Clone, Default)]
pub struct StrokeCapture {
    state: CaptureState,
    pressure: PressureModel,
}

impl StrokeCapture {
    pub fn new(pressure: PressureModel) -> Self {
        Self {
            state: CaptureState::Idle,
            pressure,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, CaptureState::Idle)
    }

    pub fn captured_pointer(&self) -> Option<PointerId> {
        match &self.state {
            CaptureState::Idle => None,
            CaptureState::Drawing { pointer_id, .. } | CaptureState::Panning { pointer_id, .. } => {
                Some(*pointer_id)
            }
        }
    }

    pub fn active_stroke(&self) -> Option<&ActiveStroke> {
        match &self.state {
            CaptureState::Drawing { stroke, .. } => Some(stroke),
            _ => None,
        }
    }

    /// The in-progress stroke as it should be previewed.
    pub fn preview(&self) -> Option<Stroke> {
        self.active_stroke().map(ActiveStroke::to_stroke)
    }

    /// Starts a gesture with the brush's current tool. Returns false when
    /// another pointer already owns the capture.
    pub fn begin(&mut self, sample: &PointerSample, brush: &BrushSettings, viewport: &Viewport) -> bool {
        if let Some(owner) = self.captured_pointer() {
            log::debug!(
                "Ignoring pointer {} down while pointer {owner} is captured",
                sample.pointer_id
            );
            return false;
        }

        let logical = viewport.to_logical(sample.position);
        if !is_finite(sample.position) || !is_finite(logical) {
            log::warn!("Ignoring non-finite pointer down {:?}", sample.position);
            return false;
        }

        self.state = match brush.tool.stroke_tool() {
            None => CaptureState::Panning {
                pointer_id: sample.pointer_id,
                last_pos: sample.position,
            },
            Some(tool) => {
                let mut stroke =
                    ActiveStroke::new(tool, brush.color, brush.size, brush.opacity, brush.outline());
                let pressure = self.pressure.resolve(sample.pressure, &[logical], &[sample.time_ms]);
                stroke.add_point(StrokePoint::new(logical.x, logical.y, pressure), sample.time_ms);
                CaptureState::Drawing {
                    pointer_id: sample.pointer_id,
                    stroke,
                }
            }
        };
        log::debug!("Pointer {} captured for {:?}", sample.pointer_id, brush.tool);
        true
    }

    /// Feeds a move sample. Samples from pointers that do not own the
    /// capture are ignored.
    pub fn extend(&mut self, sample: &PointerSample, viewport: &mut Viewport) -> MoveOutcome {
        let pressure_model = self.pressure;
        match &mut self.state {
            CaptureState::Drawing { pointer_id, stroke } if *pointer_id == sample.pointer_id => {
                let logical = viewport.to_logical(sample.position);
                if !is_finite(logical) {
                    log::warn!("Dropping non-finite sample {:?}", sample.position);
                    return MoveOutcome::Ignored;
                }
                // Simulated pressure only looks at the latest segment.
                let pressure = match stroke.last_sample() {
                    Some((last, last_ms)) => pressure_model.resolve(
                        sample.pressure,
                        &[last, logical],
                        &[last_ms, sample.time_ms],
                    ),
                    None => pressure_model.resolve(sample.pressure, &[logical], &[sample.time_ms]),
                };
                stroke.add_point(StrokePoint::new(logical.x, logical.y, pressure), sample.time_ms);
                MoveOutcome::StrokeExtended
            }
            CaptureState::Panning { pointer_id, last_pos } if *pointer_id == sample.pointer_id => {
                if !is_finite(sample.position) {
                    return MoveOutcome::Ignored;
                }
                viewport.pan(sample.position - *last_pos);
                *last_pos = sample.position;
                MoveOutcome::Panned
            }
            _ => MoveOutcome::Ignored,
        }
    }

    /// Ends the gesture owned by `pointer_id` (release or cancel) and
    /// returns to idle. `None` if that pointer owns nothing.
    pub fn finish(&mut self, pointer_id: PointerId) -> Option<CaptureOutcome> {
        if self.captured_pointer() != Some(pointer_id) {
            return None;
        }
        let outcome = match std::mem::take(&mut self.state) {
            CaptureState::Idle => return None,
            CaptureState::Panning { .. } => CaptureOutcome::PanEnded,
            CaptureState::Drawing { stroke, .. } => match stroke.tool() {
                StrokeTool::Eraser => {
                    let size = stroke.size();
                    CaptureOutcome::Erase {
                        path: stroke.into_stroke().points().to_vec(),
                        size,
                    }
                }
                StrokeTool::Pen | StrokeTool::Highlighter => {
                    let stroke = stroke.into_stroke();
                    if stroke.is_committable() {
                        CaptureOutcome::Commit(stroke)
                    } else {
                        log::debug!("Discarding {}-point stroke", stroke.points().len());
                        CaptureOutcome::Discard
                    }
                }
            },
        };
        log::debug!("Pointer {pointer_id} released");
        Some(outcome)
    }

    /// Restyles the in-progress stroke. Returns true if one was changed.
    pub fn restyle(&mut self, brush: &BrushSettings) -> bool {
        match &mut self.state {
            CaptureState::Drawing { stroke, .. } => {
                stroke.set_color(brush.color);
                stroke.set_size(brush.size);
                stroke.set_opacity(brush.opacity);
                stroke.set_outline(brush.outline());
                true
            }
            _ => false,
        }
    }
}

fn is_finite(pos: Pos2) -> bool {
    pos.x.is_finite() && pos.y.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;
    use egui::{Color32, Vec2, pos2};

    fn brush(tool: Tool) -> BrushSettings {
        BrushSettings {
            tool,
            ..BrushSettings::default()
        }
    }

    fn sample(id: PointerId, x: f32, y: f32, t: f64) -> PointerSample {
        PointerSample::new(id, pos2(x, y), t)
    }

    #[test]
    fn test_drawing_collects_logical_points() {
        let mut capture = StrokeCapture::default();
        let mut viewport = Viewport::default();
        viewport.pan(Vec2::new(10.0, 0.0));
        viewport.zoom_by(1.0);

        assert!(capture.begin(&sample(0, 10.0, 0.0, 0.0), &brush(Tool::Pen), &viewport));
        assert_eq!(
            capture.extend(&sample(0, 30.0, 20.0, 16.0), &mut viewport),
            MoveOutcome::StrokeExtended
        );
        match capture.finish(0) {
            Some(CaptureOutcome::Commit(stroke)) => {
                assert_eq!(stroke.points()[0].pos(), pos2(0.0, 0.0));
                assert_eq!(stroke.points()[1].pos(), pos2(10.0, 10.0));
                assert_eq!(stroke.tool(), StrokeTool::Pen);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(capture.is_idle());
    }

    #[test]
    fn test_tap_is_discarded() {
        let mut capture = StrokeCapture::default();
        let viewport = Viewport::default();
        capture.begin(&sample(0, 5.0, 5.0, 0.0), &brush(Tool::Highlighter), &viewport);
        assert_eq!(capture.finish(0), Some(CaptureOutcome::Discard));
    }

    #[test]
    fn test_eraser_yields_path() {
        let mut capture = StrokeCapture::default();
        let mut viewport = Viewport::default();
        let mut eraser = brush(Tool::Eraser);
        eraser.size = 6.0;
        capture.begin(&sample(0, 1.0, 1.0, 0.0), &eraser, &viewport);
        capture.extend(&sample(0, 2.0, 2.0, 10.0), &mut viewport);
        match capture.finish(0) {
            Some(CaptureOutcome::Erase { path, size }) => {
                assert_eq!(path.len(), 2);
                assert_eq!(size, 6.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_second_pointer_is_ignored_while_captured() {
        let mut capture = StrokeCapture::default();
        let mut viewport = Viewport::default();
        capture.begin(&sample(1, 0.0, 0.0, 0.0), &brush(Tool::Pen), &viewport);

        assert!(!capture.begin(&sample(2, 50.0, 50.0, 1.0), &brush(Tool::Pen), &viewport));
        assert_eq!(
            capture.extend(&sample(2, 60.0, 60.0, 2.0), &mut viewport),
            MoveOutcome::Ignored
        );
        assert_eq!(capture.finish(2), None);
        assert_eq!(capture.active_stroke().map(|s| s.points().len()), Some(1));
        assert_eq!(capture.captured_pointer(), Some(1));
    }

    #[test]
    fn test_panning_moves_viewport_by_screen_delta() {
        let mut capture = StrokeCapture::default();
        let mut viewport = Viewport::default();
        viewport.zoom_by(1.0);
        capture.begin(&sample(0, 100.0, 100.0, 0.0), &brush(Tool::Pan), &viewport);
        assert_eq!(
            capture.extend(&sample(0, 130.0, 90.0, 5.0), &mut viewport),
            MoveOutcome::Panned
        );
        capture.extend(&sample(0, 140.0, 90.0, 10.0), &mut viewport);
        assert_eq!(viewport.pan_offset(), Vec2::new(40.0, -10.0));
        assert_eq!(capture.finish(0), Some(CaptureOutcome::PanEnded));
        assert!(capture.preview().is_none());
    }

    #[test]
    fn test_hardware_pressure_is_used() {
        let mut capture = StrokeCapture::default();
        let mut viewport = Viewport::default();
        capture.begin(&sample(3, 0.0, 0.0, 0.0).with_pressure(0.9), &brush(Tool::Pen), &viewport);
        capture.extend(&sample(3, 1.0, 0.0, 8.0).with_pressure(0.0), &mut viewport);
        let preview = capture.preview().unwrap();
        assert_eq!(preview.points()[0].pressure, 0.9);
        // Zero counts as missing, so the second point is simulated.
        assert!(preview.points()[1].pressure < 1.0 && preview.points()[1].pressure > 0.0);
    }

    #[test]
    fn test_restyle_changes_whole_stroke_but_not_tool() {
        let mut capture = StrokeCapture::default();
        let mut viewport = Viewport::default();
        capture.begin(&sample(0, 0.0, 0.0, 0.0), &brush(Tool::Pen), &viewport);
        capture.extend(&sample(0, 5.0, 5.0, 10.0), &mut viewport);

        let mut changed = brush(Tool::Highlighter);
        changed.color = Color32::RED;
        changed.size = 20.0;
        assert!(capture.restyle(&changed));

        let preview = capture.preview().unwrap();
        assert_eq!(preview.color(), Color32::RED);
        assert_eq!(preview.size(), 20.0);
        assert_eq!(preview.tool(), StrokeTool::Pen);
    }

    #[test]
    fn test_non_finite_down_does_not_capture() {
        let mut capture = StrokeCapture::default();
        let viewport = Viewport::default();
        assert!(!capture.begin(&sample(0, f32::NAN, 0.0, 0.0), &brush(Tool::Pen), &viewport));
        assert!(!capture.begin(&sample(0, 0.0, f32::INFINITY, 0.0), &brush(Tool::Pan), &viewport));
        assert!(capture.is_idle());

        // The next valid down still starts a gesture.
        assert!(capture.begin(&sample(0, 1.0, 1.0, 0.0), &brush(Tool::Pen), &viewport));
        assert_eq!(capture.active_stroke().map(|s| s.points().len()), Some(1));
    }

    #[test]
    fn test_simulated_pressure_uses_latest_segment() {
        let mut capture = StrokeCapture::default();
        let mut viewport = Viewport::default();
        capture.begin(&sample(0, 0.0, 0.0, 0.0), &brush(Tool::Pen), &viewport);
        // Slow segment, then a fast one.
        capture.extend(&sample(0, 1.0, 0.0, 100.0), &mut viewport);
        capture.extend(&sample(0, 101.0, 0.0, 110.0), &mut viewport);

        let model = PressureModel::default();
        let preview = capture.preview().unwrap();
        let expected = model.simulate(&[pos2(1.0, 0.0), pos2(101.0, 0.0)], &[100.0, 110.0]);
        assert_eq!(preview.points()[2].pressure, expected);
        assert!(preview.points()[2].pressure < preview.points()[1].pressure);
    }
}
