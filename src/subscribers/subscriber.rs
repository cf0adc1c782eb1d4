//! # Lifecycle observer trait.
//!
//! [`Subscribe`] is how code outside the orchestrator watches boot attempts
//! without taking part in them: audit logs, metrics, dashboards.
//!
//! An observer is driven by its own worker and queue inside
//! [`SubscriberSet`](crate::SubscriberSet); it can never delay an attempt or
//! the callers waiting on it. A panic inside [`Subscribe::on_event`] is logged
//! and the worker moves on to the next event.
//!
//! Observers that only care about some events should narrow
//! [`Subscribe::accepts`]: filtered events are never queued, so they cannot
//! crowd out the interesting ones.

use async_trait::async_trait;

use crate::events::{Event, EventKind};

/// Observer of boot lifecycle events.
///
/// Use async I/O inside `on_event`; a blocking call stalls only this
/// observer's worker, but still ties up an executor thread.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Events arrive in publication order.
    async fn on_event(&self, event: &Event);

    /// Whether events of `kind` should be delivered at all. Default: every kind.
    fn accepts(&self, _kind: EventKind) -> bool {
        true
    }

    /// Name used in logs when the observer drops an event or panics.
    ///
    /// Defaults to `type_name::<Self>()`; override with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity of this observer (at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
