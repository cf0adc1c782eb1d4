//! # SubscriberSet: non-blocking fan-out over multiple observers
//!
//! [`SubscriberSet`] distributes each [`Event`] to multiple observers
//! **without awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-observer FIFO (queue order).
//! - Panics inside observers are caught and logged (isolation).
//! - Kinds an observer does not [`accepts`](Subscribe::accepts) never reach its queue.
//!
//! ## What it does **not** guarantee
//! - No global ordering across different observers.
//! - No retries on per-observer queue overflow (events are dropped for that observer).
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        │                        (Arc-clone per observer)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::Event;

use super::Subscribe;

/// Per-observer channel with metadata.
struct SubscriberChannel {
    name: &'static str,
    observer: Arc<dyn Subscribe>,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-observer bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per observer.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let observer = Arc::clone(&sub);
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        tracing::error!(
                            subscriber = name,
                            seq = ev.seq,
                            panic = ?panic,
                            "observer panicked while handling event"
                        );
                    }
                }
            });

            channels.push(SubscriberChannel {
                name,
                observer,
                sender: tx,
            });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fan-out one event to all observers (non-blocking).
    ///
    /// If an observer's queue is **full** or **closed**, the event is dropped for it
    /// and a warning is logged with the observer's name.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for channel in self.channels.iter().filter(|c| c.observer.accepts(event.kind)) {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(subscriber = channel.name, seq = ev.seq, "observer dropped event: queue full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(subscriber = channel.name, seq = ev.seq, "observer dropped event: worker closed");
                }
            }
        }
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no observers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Exploder;

    #[async_trait]
    impl Subscribe for Exploder {
        async fn on_event(&self, _event: &Event) {
            panic!("boom");
        }
    }

    #[tokio::test]
    async fn test_fan_out_survives_panicking_observer() {
        let recorder = Arc::new(Recorder::default());
        let observers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Exploder), recorder.clone()];
        let set = SubscriberSet::new(observers);
        assert_eq!(set.len(), 2);

        set.emit(&Event::new(EventKind::BootStarting));
        set.emit(&Event::new(EventKind::BootResolved));
        set.shutdown().await;

        assert_eq!(
            *recorder.seen.lock(),
            vec![EventKind::BootStarting, EventKind::BootResolved]
        );
    }

    struct TerminalOnly(Arc<Recorder>);

    #[async_trait]
    impl Subscribe for TerminalOnly {
        async fn on_event(&self, event: &Event) {
            self.0.on_event(event).await;
        }

        fn accepts(&self, kind: EventKind) -> bool {
            kind == EventKind::BootResolved
        }
    }

    #[tokio::test]
    async fn test_filtered_kinds_are_not_queued() {
        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn Subscribe> = Arc::new(TerminalOnly(recorder.clone()));
        let set = SubscriberSet::new(vec![observer]);

        set.emit(&Event::new(EventKind::BootStarting));
        set.emit(&Event::new(EventKind::ScriptExited));
        set.emit(&Event::new(EventKind::BootResolved));
        set.shutdown().await;

        assert_eq!(*recorder.seen.lock(), vec![EventKind::BootResolved]);
    }

    #[tokio::test]
    async fn test_empty_set() {
        let set = SubscriberSet::new(Vec::new());
        assert!(set.is_empty());
        set.emit(&Event::new(EventKind::ScriptExited));
    }
}
