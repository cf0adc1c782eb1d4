//! # Readiness poller: wait until a booted server answers.
//!
//! [`await_ready`] repeatedly runs a reachability probe at a fixed cadence until
//! the probe answers `true` or the deadline passes.
//!
//! ## Flow
//! ```text
//! loop {
//!   ├─► tick (first tick is immediate, then every `interval`)
//!   ├─► now >= deadline ──► TimedOut
//!   ├─► probe (bounded by `probe_timeout` and the time left, panics caught)
//!   │     ├─ Ok(true)           ──► Ready (no further probes)
//!   │     └─ Ok(false) / Err / timeout / panic ──► not reachable this round
//!   └─► continue
//! }
//! ```
//!
//! ## Rules
//! - A failing probe is **never** fatal; it only counts as "not reachable".
//! - Suspension happens on a tokio timer; the calling task yields between probes.
//! - The poller owns no shared state; it must be driven from a background task,
//!   never from a request-handling path.
//! - A late tick (slow probe, busy runtime) delays the next one instead of bursting.
//! - No probe outlives the deadline, so a hung probe cannot hold the attempt open.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Smallest interval accepted by the poller; zero would spin.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Longest readiness window; larger timeouts are clamped to it.
const MAX_WINDOW: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Cadence of readiness polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Spacing between two probes.
    pub interval: Duration,
    /// Upper bound for one probe (`None` = unbounded).
    pub probe_timeout: Option<Duration>,
}

/// Result of [`await_ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// A probe succeeded.
    Ready {
        /// Probes issued, including the successful one.
        probes: u32,
    },
    /// The deadline passed first.
    TimedOut {
        /// Probes issued.
        probes: u32,
    },
}

impl Readiness {
    /// True for [`Readiness::Ready`].
    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready { .. })
    }

    /// Number of probes issued.
    #[inline]
    pub fn probes(&self) -> u32 {
        match *self {
            Readiness::Ready { probes } | Readiness::TimedOut { probes } => probes,
        }
    }
}

/// Returns the instant `timeout` from now, clamped so it never overflows.
pub(crate) fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout.min(MAX_WINDOW))
        .unwrap_or_else(|| now + Duration::from_secs(86_400))
}

/// Polls `probe` every `policy.interval` until it answers `true` or `deadline` passes.
///
/// `probe` is called once per round and must produce a fresh future each time.
/// Errors, panics and probe timeouts count as "not reachable" for that round.
/// Each probe is cut off at `deadline` even when `policy.probe_timeout` is
/// longer or unbounded.
pub async fn await_ready<F, Fut>(
    server: &str,
    mut probe: F,
    policy: PollPolicy,
    deadline: Instant,
) -> Readiness
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    let mut ticker = time::interval(policy.interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut probes: u32 = 0;

    loop {
        ticker.tick().await;
        if Instant::now() >= deadline {
            return Readiness::TimedOut { probes };
        }

        let left = deadline.saturating_duration_since(Instant::now());
        let limit = policy.probe_timeout.map_or(left, |p| p.min(left));

        probes = probes.saturating_add(1);
        if probe_once(server, probe(), Some(limit)).await {
            return Readiness::Ready { probes };
        }
    }
}

/// Runs one probe; anything but `Ok(true)` is "not reachable".
pub(crate) async fn probe_once<Fut>(server: &str, fut: Fut, limit: Option<Duration>) -> bool
where
    Fut: Future<Output = anyhow::Result<bool>>,
{
    let guarded = AssertUnwindSafe(fut).catch_unwind();
    let res = match limit {
        Some(limit) => match time::timeout(limit, guarded).await {
            Ok(res) => res,
            Err(_elapsed) => {
                tracing::debug!(server, limit_ms = limit.as_millis() as u64, "reachability probe timed out");
                return false;
            }
        },
        None => guarded.await,
    };

    match res {
        Ok(Ok(reachable)) => reachable,
        Ok(Err(e)) => {
            tracing::debug!(server, error = %e, "reachability probe failed");
            false
        }
        Err(_panic) => {
            tracing::warn!(server, "reachability probe panicked; treating server as unreachable");
            false
        }
    }
}
