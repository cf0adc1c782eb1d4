//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to boot lifecycle events emitted by the orchestrator.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Orchestrator` (admission, attempt continuation, resolution).
//! - **Consumers**: the orchestrator's listener (fans out to `SubscriberSet`),
//!   or anyone holding [`Orchestrator::subscribe_events`](crate::Orchestrator::subscribe_events).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
