use futures::FutureExt;
use futures::StreamExt;
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::task::noop_waker_ref;
use serde::{Deserialize, Serialize};
use std::task::{Context, Poll};

use crate::document::{DrawingContent, PageId};

mod backend;
pub use backend::{FileBackend, MemoryBackend, SaveBackend, SaveResult};

pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 1000;

/// Save state reported to the surrounding UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Saved,
    Saving,
    Error,
}

struct PendingSave {
    content: DrawingContent,
    due_ms: f64,
}

type InFlightSave = LocalBoxFuture<'static, (u64, SaveResult)>;

/// Debounces saves of a drawing and tracks their outcome.
///
/// The bridge is driven by the host: `request_save` on every edit and `poll`
/// on every frame or timer tick. Nothing blocks; in-flight saves are polled
/// cooperatively.
pub struct PersistenceBridge {
    page: PageId,
    backend: Box<dyn SaveBackend>,
    debounce_ms: f64,
    pending: Option<PendingSave>,
    in_flight: FuturesUnordered<InFlightSave>,
    /// Generation of the most recently issued save.
    generation: u64,
    status: SaveStatus,
}

impl std::fmt::Debug for PersistenceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceBridge")
            .field("page", &self.page)
            .field("debounce_ms", &self.debounce_ms)
            .field("pending", &self.pending.as_ref().map(|p| p.due_ms))
            .field("in_flight", &self.in_flight.len())
            .field("generation", &self.generation)
            .field("status", &self.status)
            .finish()
    }
}

impl PersistenceBridge {
    pub fn new(page: PageId, backend: Box<dyn SaveBackend>, debounce_ms: u64) -> Self {
        Self {
            page,
            backend,
            debounce_ms: debounce_ms as f64,
            pending: None,
            in_flight: FuturesUnordered::new(),
            generation: 0,
            status: SaveStatus::Saved,
        }
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    /// True while a save is scheduled or running.
    pub fn is_saving(&self) -> bool {
        self.pending.is_some() || !self.in_flight.is_empty()
    }

    /// When the scheduled save fires, if one is scheduled.
    pub fn next_deadline(&self) -> Option<f64> {
        self.pending.as_ref().map(|p| p.due_ms)
    }

    /// Replaces any scheduled save with one for `content`, due after the
    /// debounce delay. Returns the new status if it changed.
    pub fn request_save(&mut self, content: DrawingContent, now_ms: f64) -> Option<SaveStatus> {
        if self.pending.is_some() {
            log::debug!("Rescheduling pending save for page {}", self.page);
        }
        self.pending = Some(PendingSave {
            content,
            due_ms: now_ms + self.debounce_ms,
        });
        self.set_status(SaveStatus::Saving)
    }

    /// Fires the scheduled save if its delay has elapsed and collects the
    /// results of finished saves. Returns the new status if it changed.
    pub fn poll(&mut self, now_ms: f64) -> Option<SaveStatus> {
        if self.pending.as_ref().is_some_and(|p| now_ms >= p.due_ms) {
            self.fire();
        }
        self.collect()
    }

    /// Sends the scheduled save right away, e.g. when the page closes.
    pub fn flush(&mut self) -> Option<SaveStatus> {
        if self.pending.is_some() {
            self.fire();
        }
        self.collect()
    }

    fn fire(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        self.generation += 1;
        let generation = self.generation;
        log::debug!(
            "Saving page {} ({} strokes, generation {generation})",
            self.page,
            pending.content.len()
        );
        let save = self.backend.save(&self.page, &pending.content);
        self.in_flight
            .push(save.map(move |result| (generation, result)).boxed_local());
    }

    fn collect(&mut self) -> Option<SaveStatus> {
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut changed = None;
        while let Poll::Ready(Some((generation, result))) = self.in_flight.poll_next_unpin(&mut cx) {
            let current = generation == self.generation && self.pending.is_none();
            match &result {
                Ok(()) => log::info!("Saved page {} (generation {generation})", self.page),
                Err(err) => log::warn!("Failed to save page {} (generation {generation}): {err}", self.page),
            }
            if !current {
                log::debug!("Ignoring outcome of superseded save {generation}");
                continue;
            }
            let status = match result {
                Ok(()) => SaveStatus::Saved,
                Err(_) => SaveStatus::Error,
            };
            if let Some(status) = self.set_status(status) {
                changed = Some(status);
            }
        }
        changed
    }

    fn set_status(&mut self, status: SaveStatus) -> Option<SaveStatus> {
        if self.status == status {
            return None;
        }
        self.status = status;
        Some(status)
    }
}
