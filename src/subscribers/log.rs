//! # LogWriter: lifecycle events rendered through `tracing`
//!
//! A minimal observer that turns every [`Event`] into one structured log record
//! under the `bootvisor::events` target. Useful for demos and for deployments
//! that only want logs.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO bootvisor::events: boot starting server="survival" script="scripts/start_survival.sh"
//! INFO bootvisor::events: script exited server="survival" exit_code=0
//! INFO bootvisor::events: polling for readiness server="survival" timeout_ms=30000
//! INFO bootvisor::events: server ready server="survival" probes=3
//! INFO bootvisor::events: boot resolved server="survival" outcome="success" notified=1 connected=1
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let server = e.server.as_deref().unwrap_or("unknown");
        match e.kind {
            EventKind::BootStarting => {
                tracing::info!(target: "bootvisor::events", server, script = ?e.reason, "boot starting");
            }
            EventKind::ScriptExited => {
                tracing::info!(target: "bootvisor::events", server, exit_code = ?e.exit_code, "script exited");
            }
            EventKind::PollStarted => {
                tracing::info!(target: "bootvisor::events", server, timeout_ms = ?e.timeout_ms, "polling for readiness");
            }
            EventKind::ServerReady => {
                tracing::info!(target: "bootvisor::events", server, probes = ?e.attempt, "server ready");
            }
            EventKind::BootTimedOut => {
                tracing::warn!(
                    target: "bootvisor::events",
                    server,
                    timeout_ms = ?e.timeout_ms,
                    probes = ?e.attempt,
                    "server did not become reachable in time"
                );
            }
            EventKind::ScriptMissing => {
                tracing::warn!(target: "bootvisor::events", server, path = ?e.reason, "no startup script");
            }
            EventKind::LaunchFailed => {
                tracing::warn!(target: "bootvisor::events", server, error = ?e.reason, "launch failed");
            }
            EventKind::BootResolved => {
                tracing::info!(
                    target: "bootvisor::events",
                    server,
                    outcome = %e.outcome.map(|o| o.to_string()).unwrap_or_default(),
                    notified = ?e.notified,
                    connected = ?e.connected,
                    "boot resolved"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
