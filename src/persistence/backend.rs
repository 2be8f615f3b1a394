use futures::FutureExt;
use futures::future::LocalBoxFuture;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::document::{DrawingContent, PageId};
use crate::error::SaveError;

/// Result type for save operations
pub type SaveResult = Result<(), SaveError>;

/// The external capability that stores a drawing. Implementations decide
/// where the bytes go; the bridge only cares whether the call succeeded.
pub trait SaveBackend {
    fn save(&self, page: &PageId, content: &DrawingContent) -> LocalBoxFuture<'static, SaveResult>;
}

/// Stores each page as `<dir>/<page id>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn page_path(&self, page: &PageId) -> PathBuf {
        self.dir.join(format!("{page}.json"))
    }

    /// Loads a page. Missing or unreadable files give an empty drawing.
    pub fn load(&self, page: &PageId) -> DrawingContent {
        let path = self.page_path(page);
        match fs::read_to_string(&path) {
            Ok(json) => DrawingContent::load_or_empty(Some(&json)),
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Failed to read {}: {err}", path.display());
                }
                DrawingContent::load_or_empty(None)
            }
        }
    }
}

impl SaveBackend for FileBackend {
    fn save(&self, page: &PageId, content: &DrawingContent) -> LocalBoxFuture<'static, SaveResult> {
        let json = match serde_json::to_string_pretty(content) {
            Ok(json) => json,
            Err(err) => return futures::future::ready(Err(err.into())).boxed_local(),
        };
        let dir = self.dir.clone();
        let path = self.page_path(page);
        async move {
            fs::create_dir_all(&dir)?;
            // Write to a sibling first so a crash never leaves half a file behind.
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, json)?;
            fs::rename(&tmp, &path)?;
            log::debug!("Wrote {}", path.display());
            Ok(())
        }
        .boxed_local()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    saves: Vec<(PageId, DrawingContent)>,
    failing: bool,
}

/// Keeps every saved version in memory. Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent saves fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    pub fn save_count(&self) -> usize {
        self.state.lock().saves.len()
    }

    pub fn saves(&self) -> Vec<(PageId, DrawingContent)> {
        self.state.lock().saves.clone()
    }

    pub fn last_saved(&self) -> Option<DrawingContent> {
        self.state.lock().saves.last().map(|(_, content)| content.clone())
    }
}

impl SaveBackend for MemoryBackend {
    fn save(&self, page: &PageId, content: &DrawingContent) -> LocalBoxFuture<'static, SaveResult> {
        let mut state = self.state.lock();
        let result = if state.failing {
            Err(SaveError::Backend("memory backend set to fail".to_owned()))
        } else {
            state.saves.push((*page, content.clone()));
            Ok(())
        };
        futures::future::ready(result).boxed_local()
    }
}
