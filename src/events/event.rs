//! # Runtime events emitted by the orchestrator.
//!
//! The [`EventKind`] enum classifies event types across two categories:
//! - **Attempt events**: one boot attempt's progress (starting, exited, polling, ready, timed out)
//!   and its early aborts (script missing, launch failed)
//! - **Terminal events**: the attempt's subscribers were resolved
//!
//! The [`Event`] struct carries additional metadata such as timestamps, server name,
//! exit code and subscriber counts.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use bootvisor::{BootOutcome, Event, EventKind};
//!
//! let ev = Event::new(EventKind::BootResolved)
//!     .with_server("survival")
//!     .with_outcome(BootOutcome::Timeout)
//!     .with_timeout(Duration::from_secs(30));
//!
//! assert_eq!(ev.kind, EventKind::BootResolved);
//! assert_eq!(ev.server.as_deref(), Some("survival"));
//! assert_eq!(ev.timeout_ms, Some(30_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::BootOutcome;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Attempt events ===
    /// Boot slot claimed, script about to be launched.
    ///
    /// Sets:
    /// - `server`: server name
    /// - `reason`: script path
    BootStarting,

    /// Boot script terminated.
    ///
    /// Sets:
    /// - `server`: server name
    /// - `exit_code`: process exit code (`-1` if killed by a signal)
    ScriptExited,

    /// Script succeeded; readiness polling begins.
    ///
    /// Sets:
    /// - `server`: server name
    /// - `timeout_ms`: readiness deadline applied to this server
    PollStarted,

    /// A reachability probe succeeded.
    ///
    /// Sets:
    /// - `server`: server name
    /// - `attempt`: number of probes issued, including the successful one
    ServerReady,

    /// Deadline elapsed without a successful probe.
    ///
    /// Sets:
    /// - `server`: server name
    /// - `timeout_ms`: threshold that was applied
    /// - `attempt`: number of probes issued
    BootTimedOut,

    /// No boot script exists; nothing was launched.
    ///
    /// Sets:
    /// - `server`: server name
    /// - `reason`: probed path
    ScriptMissing,

    /// OS refused to start the script.
    ///
    /// Sets:
    /// - `server`: server name
    /// - `reason`: OS error
    LaunchFailed,

    // === Terminal events ===
    /// Subscribers for the attempt were resolved; the boot slot is about to be released.
    ///
    /// Sets:
    /// - `server`: server name
    /// - `outcome`: terminal outcome
    /// - `notified`: notification subscribers told about the outcome
    /// - `connected`: delayed joins that were connected (0 on failure)
    BootResolved,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Server the event is about.
    pub server: Option<Arc<str>>,
    /// Exit code of the boot script.
    pub exit_code: Option<i32>,
    /// Readiness deadline in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Probe count.
    pub attempt: Option<u32>,
    /// Human-readable reason (paths, OS errors).
    pub reason: Option<Arc<str>>,
    /// Terminal outcome of the attempt.
    pub outcome: Option<BootOutcome>,
    /// Notification subscribers reached by resolution.
    pub notified: Option<u32>,
    /// Delayed joins connected by resolution.
    pub connected: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            server: None,
            exit_code: None,
            timeout_ms: None,
            attempt: None,
            reason: None,
            outcome: None,
            notified: None,
            connected: None,
        }
    }

    /// Attaches a server name.
    #[inline]
    pub fn with_server(mut self, server: impl Into<Arc<str>>) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Attaches an exit code.
    #[inline]
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Attaches a deadline (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a probe count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the terminal outcome.
    #[inline]
    pub fn with_outcome(mut self, outcome: BootOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Attaches resolution counters.
    #[inline]
    pub fn with_resolved(mut self, notified: usize, connected: usize) -> Self {
        self.notified = Some(u32::try_from(notified).unwrap_or(u32::MAX));
        self.connected = Some(u32::try_from(connected).unwrap_or(u32::MAX));
        self
    }

    /// True for the event that ends an attempt's subscriber lifecycle.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::BootResolved)
    }
}
