use std::collections::VecDeque;
use std::sync::Arc;

use crate::document::StrokeList;

pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// Linear undo/redo history over whole stroke-list snapshots.
///
/// Snapshots share structure with the live list (`Arc`), and the live list is
/// copied before any write, so a snapshot never changes after it is taken.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<StrokeList>,
    cursor: usize,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Records `strokes` as the newest state, dropping any redo branch.
    pub fn snapshot(&mut self, strokes: StrokeList) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(strokes);
        self.cursor = self.entries.len() - 1;

        while self.entries.len() > self.max_depth {
            self.entries.pop_front();
            self.cursor -= 1;
        }
        log::debug!("History snapshot {}/{}", self.cursor + 1, self.entries.len());
    }

    pub fn undo(&mut self) -> Option<StrokeList> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).map(Arc::clone)
    }

    pub fn redo(&mut self) -> Option<StrokeList> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).map(Arc::clone)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0 && !self.entries.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{Stroke, StrokePoint, StrokeTool};
    use egui::Color32;

    fn list(n: usize) -> StrokeList {
        Arc::new(
            (0..n)
                .map(|i| {
                    Arc::new(Stroke::new(
                        StrokeTool::Pen,
                        Color32::BLACK,
                        2.0,
                        1.0,
                        vec![
                            StrokePoint::new(i as f32, 0.0, 0.5),
                            StrokePoint::new(i as f32, 1.0, 0.5),
                        ],
                    ))
                })
                .collect(),
        )
    }

    #[test]
    fn test_undo_at_first_entry_is_noop() {
        let mut history = History::default();
        assert!(history.undo().is_none());
        history.snapshot(list(0));
        assert!(history.undo().is_none());
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn test_undo_then_redo() {
        let mut history = History::default();
        history.snapshot(list(0));
        history.snapshot(list(1));
        history.snapshot(list(2));

        assert_eq!(history.undo().map(|s| s.len()), Some(1));
        assert_eq!(history.undo().map(|s| s.len()), Some(0));
        assert!(history.undo().is_none());
        assert_eq!(history.redo().map(|s| s.len()), Some(1));
        assert_eq!(history.redo().map(|s| s.len()), Some(2));
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_new_snapshot_discards_redo_branch() {
        let mut history = History::default();
        history.snapshot(list(0));
        history.snapshot(list(1));
        history.snapshot(list(2));
        history.undo();
        history.undo();
        history.snapshot(list(5));

        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert_eq!(history.undo().map(|s| s.len()), Some(0));
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut history = History::new(50);
        for n in 0..=50 {
            history.snapshot(list(n));
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.cursor(), 49);

        let mut oldest = None;
        while let Some(state) = history.undo() {
            oldest = Some(state.len());
        }
        // The empty starting state (n = 0) has been evicted.
        assert_eq!(oldest, Some(1));
    }
}
