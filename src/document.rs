use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::ContentError;
use crate::stroke::{Stroke, StrokeRef};

/// Identifies the page a drawing belongs to when it is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub uuid::Uuid);

impl PageId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Copy-on-write stroke list. Cloning shares the list; writers clone first.
pub type StrokeList = Arc<Vec<StrokeRef>>;

/// Everything that gets persisted for one drawing page.
///
/// `strokes` is in z-order: earlier strokes render underneath later ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawingContent {
    #[serde(default)]
    strokes: StrokeList,
}

/// Wire shape used for tolerant loading: strokes are parsed one by one so a
/// single bad entry does not discard the rest.
#[derive(Deserialize)]
struct RawContent {
    #[serde(default)]
    strokes: Vec<serde_json::Value>,
}

impl DrawingContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_strokes(strokes: Vec<Stroke>) -> Self {
        Self {
            strokes: Arc::new(strokes.into_iter().map(Arc::new).collect()),
        }
    }

    pub fn strokes(&self) -> &[StrokeRef] {
        &self.strokes
    }

    /// Shares the current stroke list without copying it.
    pub fn share_strokes(&self) -> StrokeList {
        Arc::clone(&self.strokes)
    }

    pub fn replace_strokes(&mut self, strokes: StrokeList) {
        self.strokes = strokes;
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn add_stroke(&mut self, stroke: StrokeRef) {
        Arc::make_mut(&mut self.strokes).push(stroke);
    }

    /// Removes every stroke whose index is flagged in `remove`.
    /// Returns how many strokes were dropped.
    pub fn remove_where(&mut self, mut remove: impl FnMut(usize, &Stroke) -> bool) -> usize {
        let doomed: Vec<usize> = self
            .strokes
            .iter()
            .enumerate()
            .filter(|(index, stroke)| remove(*index, stroke))
            .map(|(index, _)| index)
            .collect();
        if doomed.is_empty() {
            return 0;
        }

        let strokes = Arc::make_mut(&mut self.strokes);
        let mut index = 0;
        strokes.retain(|_| {
            let keep = doomed.binary_search(&index).is_err();
            index += 1;
            keep
        });
        doomed.len()
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.strokes.len();
        if removed > 0 {
            self.strokes = Arc::default();
        }
        removed
    }

    /// Strict parse. Invalid individual strokes are dropped, but a document
    /// that is not an object with a `strokes` list is an error.
    pub fn parse(json: &str) -> Result<Self, ContentError> {
        let raw: RawContent = serde_json::from_str(json)?;
        Ok(Self::from_raw(raw))
    }

    /// Tolerant load used at page mount: absent or malformed content becomes
    /// an empty drawing.
    pub fn load_or_empty(json: Option<&str>) -> Self {
        let Some(json) = json else {
            log::debug!("No stored drawing content, starting empty");
            return Self::default();
        };
        if json.trim().is_empty() {
            return Self::default();
        }
        match Self::parse(json) {
            Ok(content) => content,
            Err(err) => {
                log::warn!("Discarding stored drawing content: {err}");
                Self::default()
            }
        }
    }

    /// Same as [`Self::load_or_empty`] for an already-decoded JSON value.
    pub fn from_value(value: Option<serde_json::Value>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        match serde_json::from_value::<RawContent>(value) {
            Ok(raw) => Self::from_raw(raw),
            Err(err) => {
                log::warn!("Discarding stored drawing content: {err}");
                Self::default()
            }
        }
    }

    fn from_raw(raw: RawContent) -> Self {
        let total = raw.strokes.len();
        let strokes: Vec<StrokeRef> = raw
            .strokes
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Stroke>(value) {
                Ok(stroke) => stroke.sanitized(),
                Err(err) => {
                    log::debug!("Skipping unreadable stroke: {err}");
                    None
                }
            })
            .map(Arc::new)
            .collect();
        if strokes.len() != total {
            log::warn!("Dropped {} invalid stroke(s) while loading", total - strokes.len());
        }
        Self {
            strokes: Arc::new(strokes),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{StrokePoint, StrokeTool};
    use egui::Color32;

    fn line(x: f32) -> Stroke {
        Stroke::new(
            StrokeTool::Pen,
            Color32::BLACK,
            4.0,
            1.0,
            vec![StrokePoint::new(x, 0.0, 0.5), StrokePoint::new(x, 10.0, 0.5)],
        )
    }

    #[test]
    fn test_clone_does_not_alias_after_mutation() {
        let mut content = DrawingContent::from_strokes(vec![line(0.0)]);
        let snapshot = content.share_strokes();
        content.add_stroke(Arc::new(line(5.0)));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(content.len(), 2);
    }

    #[test]
    fn test_remove_where_removes_flagged_strokes() {
        let mut content = DrawingContent::from_strokes(vec![line(0.0), line(1.0), line(2.0)]);
        let removed = content.remove_where(|index, _| index != 1);
        assert_eq!(removed, 2);
        assert_eq!(content.strokes()[0].points()[0].x, 1.0);
    }

    #[test]
    fn test_load_or_empty_handles_garbage() {
        assert!(DrawingContent::load_or_empty(None).is_empty());
        assert!(DrawingContent::load_or_empty(Some("")).is_empty());
        assert!(DrawingContent::load_or_empty(Some("not json")).is_empty());
        assert!(DrawingContent::load_or_empty(Some("[1, 2, 3]")).is_empty());
        assert!(DrawingContent::load_or_empty(Some("{}")).is_empty());
    }

    #[test]
    fn test_load_drops_invalid_strokes_only() {
        let json = r##"{"strokes": [
            {"points": [{"x": 0, "y": 0, "pressure": 0.5}, {"x": 1, "y": 1, "pressure": 0.5}],
             "color": "#000000", "size": 4, "opacity": 1, "tool": "pen"},
            {"points": [{"x": 0, "y": 0, "pressure": 0.5}],
             "color": "#000000", "size": 4, "opacity": 1, "tool": "pen"},
            {"points": [], "color": "#000000", "size": 4, "opacity": 1, "tool": "crayon"}
        ]}"##;
        let content = DrawingContent::load_or_empty(Some(json));
        assert_eq!(content.len(), 1);
    }

    #[test]
    fn test_from_value_accepts_missing_pressure() {
        let value = serde_json::json!({
            "strokes": [{
                "points": [{"x": 0.0, "y": 0.0}, {"x": 2.0, "y": 2.0}],
                "color": "#ff0000",
                "size": 3.0,
                "tool": "highlighter"
            }]
        });
        let content = DrawingContent::from_value(Some(value));
        assert_eq!(content.len(), 1);
        let stroke = &content.strokes()[0];
        assert_eq!(stroke.points()[0].pressure, 0.5);
        assert_eq!(stroke.opacity(), 1.0);
        assert_eq!(stroke.tool(), StrokeTool::Highlighter);
    }
}
