use egui::Pos2;

use super::{calculate_bounds, rects_overlap};

/// Upper bound on samples taken from each path during a proximity test.
pub const MAX_SAMPLES_PER_PATH: usize = 20;

/// Indices of at most `MAX_SAMPLES_PER_PATH` evenly strided points.
pub fn sample_indices(len: usize) -> impl Iterator<Item = usize> {
    let stride = len.div_ceil(MAX_SAMPLES_PER_PATH).max(1);
    (0..len).step_by(stride)
}

/// Whether two point paths pass within `radius` of each other.
///
/// Paths with fewer than two points never intersect. The second path's
/// bounding box is grown by `radius` for a quick reject; the remaining pairs
/// are compared on strided samples only, which bounds the cost on long paths.
pub fn paths_within(target: &[Pos2], eraser: &[Pos2], radius: f32) -> bool {
    if target.len() < 2 || eraser.is_empty() || radius.is_nan() || radius <= 0.0 {
        return false;
    }

    let target_box = calculate_bounds(target.iter().copied(), 0.0);
    let eraser_box = calculate_bounds(eraser.iter().copied(), radius);
    if !rects_overlap(&target_box, &eraser_box) {
        return false;
    }

    let radius_sq = radius * radius;
    sample_indices(target.len()).any(|i| {
        sample_indices(eraser.len()).any(|j| target[i].distance_sq(eraser[j]) < radius_sq)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_count_is_bounded() {
        assert_eq!(sample_indices(0).count(), 0);
        assert_eq!(sample_indices(5).count(), 5);
        assert_eq!(sample_indices(20).count(), 20);
        assert!(sample_indices(21).count() <= MAX_SAMPLES_PER_PATH);
        assert!(sample_indices(1000).count() <= MAX_SAMPLES_PER_PATH);
    }

    #[test]
    fn test_far_paths_do_not_intersect() {
        let a = [Pos2::new(0.0, 0.0), Pos2::new(10.0, 0.0)];
        let b = [Pos2::new(0.0, 100.0), Pos2::new(10.0, 100.0)];
        assert!(!paths_within(&a, &b, 5.0));
    }

    #[test]
    fn test_close_samples_intersect() {
        let a = [Pos2::new(0.0, 0.0), Pos2::new(10.0, 0.0)];
        let b = [Pos2::new(10.0, 3.0)];
        assert!(paths_within(&a, &b, 5.0));
    }

    #[test]
    fn test_distance_equal_to_radius_does_not_intersect() {
        let a = [Pos2::new(0.0, 0.0), Pos2::new(10.0, 0.0)];
        let b = [Pos2::new(10.0, 5.0)];
        assert!(!paths_within(&a, &b, 5.0));
    }

    #[test]
    fn test_single_point_target_never_intersects() {
        let a = [Pos2::new(0.0, 0.0)];
        let b = [Pos2::new(0.0, 0.0)];
        assert!(!paths_within(&a, &b, 5.0));
    }
}
