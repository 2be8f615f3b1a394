use egui::Pos2;

use crate::document::DrawingContent;
use crate::geometry::hit_testing::paths_within;
use crate::stroke::{Stroke, StrokePoint};

/// Removes whole strokes that an eraser gesture passed over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EraserEngine {
    /// Effective radius as a multiple of the configured brush size.
    radius_factor: f32,
}

impl Default for EraserEngine {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl EraserEngine {
    pub fn new(radius_factor: f32) -> Self {
        Self { radius_factor }
    }

    pub fn radius_for(&self, size: f32) -> f32 {
        self.radius_factor * size
    }

    pub fn intersects(&self, stroke: &Stroke, path: &[Pos2], radius: f32) -> bool {
        let target: Vec<Pos2> = stroke.points().iter().map(StrokePoint::pos).collect();
        paths_within(&target, path, radius)
    }

    /// Removes every stroke the eraser path touches, in one edit.
    /// Returns how many strokes were removed.
    pub fn erase(&self, content: &mut DrawingContent, path: &[StrokePoint], size: f32) -> usize {
        if path.is_empty() {
            return 0;
        }
        let radius = self.radius_for(size);
        let eraser_path: Vec<Pos2> = path.iter().map(StrokePoint::pos).collect();
        let removed = content.remove_where(|_, stroke| self.intersects(stroke, &eraser_path, radius));
        log::debug!("Eraser (radius {radius}) removed {removed} stroke(s)");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::StrokeTool;
    use egui::Color32;

    fn horizontal(y: f32) -> Stroke {
        Stroke::new(
            StrokeTool::Pen,
            Color32::BLACK,
            2.0,
            1.0,
            (0..10).map(|i| StrokePoint::new(i as f32 * 10.0, y, 0.5)).collect(),
        )
    }

    fn path(points: &[(f32, f32)]) -> Vec<StrokePoint> {
        points.iter().map(|&(x, y)| StrokePoint::new(x, y, 0.5)).collect()
    }

    #[test]
    fn test_radius_is_twice_size() {
        assert_eq!(EraserEngine::default().radius_for(6.0), 12.0);
    }

    #[test]
    fn test_erases_whole_touched_strokes() {
        let mut content = DrawingContent::from_strokes(vec![horizontal(0.0), horizontal(100.0)]);
        let removed = EraserEngine::default().erase(&mut content, &path(&[(50.0, 2.0), (52.0, 3.0)]), 2.0);
        assert_eq!(removed, 1);
        assert_eq!(content.len(), 1);
        assert_eq!(content.strokes()[0].points()[0].y, 100.0);
    }

    #[test]
    fn test_bounding_box_overlap_without_proximity_erases_nothing() {
        // Diagonal stroke whose box contains the eraser, but whose samples are far away.
        let diagonal = Stroke::new(
            StrokeTool::Pen,
            Color32::BLACK,
            2.0,
            1.0,
            path(&[(0.0, 0.0), (100.0, 100.0)]),
        );
        let mut content = DrawingContent::from_strokes(vec![diagonal]);
        let removed = EraserEngine::default().erase(&mut content, &path(&[(90.0, 10.0), (91.0, 11.0)]), 2.0);
        assert_eq!(removed, 0);
        assert_eq!(content.len(), 1);
    }

    #[test]
    fn test_empty_path_erases_nothing() {
        let mut content = DrawingContent::from_strokes(vec![horizontal(0.0)]);
        assert_eq!(EraserEngine::default().erase(&mut content, &[], 2.0), 0);
    }
}
