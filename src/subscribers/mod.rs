//! # Event observers for the bootvisor runtime.
//!
//! This module provides the [`Subscribe`] trait and built-in implementations
//! for handling lifecycle events broadcast through the [`Bus`](crate::events::Bus).
//!
//! Observers are **not** the notification subscribers of a boot attempt: those
//! are callers registered through `set_notification` and reached via
//! [`Proxy::notify`](crate::Proxy::notify). Observers see every attempt of every
//! server and exist for logging, metrics and audits.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Orchestrator ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!                                                               │
//!                                                      ┌────────┼─────────┐
//!                                                      ▼        ▼         ▼
//!                                                 LogWriter  Metrics    Custom
//! ```
//!
//! ## Implementing custom observers
//! ```no_run
//! use bootvisor::{Subscribe, Event, EventKind};
//! use async_trait::async_trait;
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if matches!(event.kind, EventKind::BootResolved)
//!             && event.outcome.is_some_and(|o| !o.is_success())
//!         {
//!             // increment failure counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
