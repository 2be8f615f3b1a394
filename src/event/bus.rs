use crate::event::{CanvasEvent, CanvasObserver};

/// Broadcasts canvas events to registered observers
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Box<dyn CanvasObserver>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &format!("<{} observers>", self.observers.len()))
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe an observer to receive events
    pub fn subscribe(&mut self, observer: Box<dyn CanvasObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Emit an event to all registered observers, in subscription order
    pub fn emit(&mut self, event: &CanvasEvent) {
        log::trace!("Emitting {event:?} to {} observers", self.observers.len());
        for observer in &mut self.observers {
            match event {
                CanvasEvent::StrokeCommitted(stroke) => observer.on_stroke_committed(stroke),
                CanvasEvent::StrokesErased(count) => observer.on_strokes_erased(*count),
                CanvasEvent::SaveStatusChanged(status) => observer.on_save_status_changed(*status),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::SaveStatus;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl CanvasObserver for Recorder {
        fn on_strokes_erased(&mut self, count: usize) {
            self.seen.lock().push(format!("erased {count}"));
        }

        fn on_save_status_changed(&mut self, status: SaveStatus) {
            self.seen.lock().push(format!("status {status:?}"));
        }
    }

    struct Silent;
    impl CanvasObserver for Silent {}

    #[test]
    fn test_emit_reaches_every_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.subscribe(Box::new(Recorder { seen: seen.clone() }));
        bus.subscribe(Box::new(Silent));
        bus.subscribe(Box::new(Recorder { seen: seen.clone() }));

        bus.emit(&CanvasEvent::StrokesErased(2));
        bus.emit(&CanvasEvent::SaveStatusChanged(SaveStatus::Saving));

        assert_eq!(bus.len(), 3);
        assert_eq!(
            *seen.lock(),
            vec!["erased 2", "erased 2", "status Saving", "status Saving"]
        );
    }
}
