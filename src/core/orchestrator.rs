//! # Orchestrator: admits boot attempts, drives them, resolves their subscribers.
//!
//! The [`Orchestrator`] owns the boot registry, both subscriber registries and the
//! event bus. It is always used through an `Arc` (see [`Orchestrator::builder`]).
//!
//! ## Attempt lifecycle
//! ```text
//! start_server(S)
//!   ├─► BootSlot::claim(S) ── taken ──► Ok(AlreadyBooting)
//!   ├─► launcher.resolve(S) ── None ──► resolve(ScriptMissing) ─► Err(ScriptMissing)
//!   ├─► publish BootStarting
//!   ├─► launcher.launch(cmd) ── Err ──► resolve(LaunchError)   ─► Err(Launch)
//!   └─► spawn attempt task ──────────────────────────────────────► Ok(Started)
//!
//! attempt task (owns the BootSlot):
//!   exit code ─► publish ScriptExited
//!     ├─ != 0 ─► resolve(NonZeroExit(code))
//!     └─ == 0 ─► publish PollStarted ─► await_ready(deadline = now + timeout_for(S))
//!                  ├─ Ready    ─► publish ServerReady  ─► resolve(Success)
//!                  └─ TimedOut ─► publish BootTimedOut ─► resolve(Timeout)
//!
//! resolve(slot, outcome):
//!   1. drain listeners(S) ─► notify each Finished { outcome }
//!   2. drain joins(S)     ─► success & S registered: notify Connecting + connect each
//!                            otherwise: discard
//!   3. publish BootResolved
//!   4. drop slot          ─► BootRegistry::end(S)
//! ```
//!
//! ## Rules
//! - Exactly one attempt per server is in flight; the slot is released exactly once,
//!   after both drains, on every path (a panicking continuation included).
//! - A subscriber is resolved by an attempt iff it was registered before that
//!   attempt's drain of its registry began. Later entries wait for the next attempt.
//! - In-flight attempts are never cancelled. [`Orchestrator::shutdown`] only stops
//!   the observer listener.
//! - No registry lock is held across an `.await`.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    core::{
        admission::{BootRegistry, BootSlot},
        builder::OrchestratorBuilder,
        launcher::Launcher,
        outcome::{Admission, BootOutcome},
        poller::{self, Readiness},
        process::ExitFuture,
        subscriptions::{Placement, TargetRegistry},
    },
    error::BootError,
    events::{Bus, Event, EventKind},
    proxy::{Notice, Proxy},
    subscribers::SubscriberSet,
};

/// Server lifecycle orchestrator.
pub struct Orchestrator<P: Proxy> {
    cfg: Config,
    proxy: Arc<P>,
    launcher: Arc<dyn Launcher>,

    booting: Arc<BootRegistry>,
    joins: TargetRegistry<P::Caller>,
    listeners: TargetRegistry<P::Caller>,

    bus: Bus,
    subs: Arc<SubscriberSet>,
    runtime_token: CancellationToken,
}

impl<P: Proxy> Orchestrator<P> {
    /// Starts building an orchestrator.
    ///
    /// `proxy` and `launcher` are shared so the caller can keep its own handles.
    pub fn builder<L: Launcher>(cfg: Config, proxy: Arc<P>, launcher: Arc<L>) -> OrchestratorBuilder<P> {
        OrchestratorBuilder::new(cfg, proxy, launcher)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        proxy: Arc<P>,
        launcher: Arc<dyn Launcher>,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        runtime_token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            proxy,
            launcher,
            booting: Arc::new(BootRegistry::new()),
            joins: TargetRegistry::new(),
            listeners: TargetRegistry::new(),
            bus,
            subs,
            runtime_token,
        }
    }

    /// Forwards bus events to the observer set until shutdown.
    pub(crate) fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        let token = self.runtime_token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event listener lagged; observers missed events");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });
    }

    // ---- admission -------------------------------------------------------

    /// Starts a boot attempt for `server` unless one is already in flight.
    ///
    /// Returns as soon as the boot process is launched; the rest of the attempt
    /// runs on a background task and is observable only through notifications.
    ///
    /// # Errors
    /// - [`BootError::ScriptMissing`]: nothing to run; subscribers of `server` were resolved with
    ///   [`BootOutcome::ScriptMissing`].
    /// - [`BootError::Launch`]: the OS refused to start the script; subscribers were resolved
    ///   with [`BootOutcome::LaunchError`].
    pub async fn start_server(self: &Arc<Self>, server: &str) -> Result<Admission, BootError> {
        self.begin(server, None).await
    }

    /// Registers `caller` for the outcome of `server`, then starts it.
    ///
    /// On admission (new or already running attempt) the caller is told
    /// [`Notice::Starting`]. On error the caller has already received the
    /// failure through the abort fan-out, so nothing else is sent.
    pub async fn start_server_with_notify(
        self: &Arc<Self>,
        server: &str,
        caller: P::Caller,
    ) -> Result<Admission, BootError> {
        self.listeners.set(caller.clone(), server);
        self.begin(server, Some(&caller)).await
    }

    async fn begin(self: &Arc<Self>, server: &str, announce: Option<&P::Caller>) -> Result<Admission, BootError> {
        let Some(slot) = BootSlot::claim(&self.booting, server) else {
            tracing::debug!(server, "boot attempt already in flight");
            if let Some(caller) = announce {
                self.announce_start(caller, server).await;
            }
            return Ok(Admission::AlreadyBooting);
        };

        let Some(command) = self.launcher.resolve(server) else {
            let path = self.launcher.script_path(server);
            tracing::warn!(server, path = %path.display(), "no startup script defined");
            self.bus.publish(
                Event::new(EventKind::ScriptMissing)
                    .with_server(server)
                    .with_reason(path.display().to_string()),
            );
            self.resolve(slot, BootOutcome::ScriptMissing).await;
            return Err(BootError::ScriptMissing {
                server: server.to_owned(),
                path,
            });
        };

        self.bus.publish(
            Event::new(EventKind::BootStarting)
                .with_server(server)
                .with_reason(command.script.display().to_string()),
        );

        let exit = match self.launcher.launch(&command) {
            Ok(exit) => exit,
            Err(source) => {
                tracing::error!(server, program = %command.program, error = %source, "failed to launch startup script");
                self.bus.publish(
                    Event::new(EventKind::LaunchFailed)
                        .with_server(server)
                        .with_reason(source.to_string()),
                );
                self.resolve(slot, BootOutcome::LaunchError).await;
                return Err(BootError::Launch {
                    server: server.to_owned(),
                    source,
                });
            }
        };
        tracing::info!(server, script = %command.script.display(), "startup script launched");

        if let Some(caller) = announce {
            self.announce_start(caller, server).await;
        }

        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_attempt(slot, exit).await });
        Ok(Admission::Started)
    }

    async fn announce_start(&self, caller: &P::Caller, server: &str) {
        let notice = Notice::Starting {
            server: server.to_owned(),
        };
        self.proxy.notify(caller, notice).await;
    }

    // ---- attempt ---------------------------------------------------------

    async fn run_attempt(self: Arc<Self>, slot: BootSlot, exit: ExitFuture) {
        let server = slot.server().to_owned();

        let code = exit.await;
        self.bus.publish(
            Event::new(EventKind::ScriptExited)
                .with_server(server.as_str())
                .with_exit_code(code),
        );

        let outcome = if code != 0 {
            tracing::error!(server = %server, code, "startup script exited with non-zero code");
            BootOutcome::NonZeroExit(code)
        } else {
            self.poll_until_ready(&server).await
        };

        self.resolve(slot, outcome).await;
    }

    async fn poll_until_ready(&self, server: &str) -> BootOutcome {
        let timeout = self.cfg.timeout_for(server);
        self.bus.publish(
            Event::new(EventKind::PollStarted)
                .with_server(server)
                .with_timeout(timeout),
        );

        let deadline = poller::deadline_after(timeout);
        let readiness = poller::await_ready(server, || self.probe(server), self.cfg.poll_policy(), deadline).await;

        match readiness {
            Readiness::Ready { probes } => {
                tracing::info!(server, probes, "server is online");
                self.bus.publish(
                    Event::new(EventKind::ServerReady)
                        .with_server(server)
                        .with_attempt(probes),
                );
                BootOutcome::Success
            }
            Readiness::TimedOut { probes } => {
                tracing::error!(
                    server,
                    timeout_secs = timeout.as_secs(),
                    probes,
                    "server did not come online in time; consider raising its startup timeout"
                );
                self.bus.publish(
                    Event::new(EventKind::BootTimedOut)
                        .with_server(server)
                        .with_timeout(timeout)
                        .with_attempt(probes),
                );
                BootOutcome::Timeout
            }
        }
    }

    /// One reachability check; an unregistered server is unreachable.
    async fn probe(&self, server: &str) -> anyhow::Result<bool> {
        match self.proxy.server(server) {
            Some(handle) => self.proxy.ping(&handle).await,
            None => Ok(false),
        }
    }

    // ---- resolution ------------------------------------------------------

    async fn resolve(&self, slot: BootSlot, outcome: BootOutcome) {
        let server = slot.server().to_owned();

        let listeners = self.listeners.drain_targeting(&server);
        for caller in &listeners {
            let notice = Notice::Finished {
                server: server.clone(),
                outcome,
            };
            self.proxy.notify(caller, notice).await;
        }

        let joins = self.joins.drain_targeting(&server);
        let connected = if outcome.is_success() {
            self.connect_joins(&server, &joins).await
        } else {
            if !joins.is_empty() {
                tracing::debug!(server = %server, discarded = joins.len(), outcome = %outcome, "discarding delayed joins");
            }
            0
        };

        tracing::info!(
            server = %server,
            outcome = %outcome,
            notified = listeners.len(),
            connected,
            "boot attempt resolved"
        );
        self.bus.publish(
            Event::new(EventKind::BootResolved)
                .with_server(server.as_str())
                .with_outcome(outcome)
                .with_resolved(listeners.len(), connected),
        );

        drop(slot);
    }

    async fn connect_joins(&self, server: &str, joins: &[P::Caller]) -> usize {
        if joins.is_empty() {
            return 0;
        }
        let Some(handle) = self.proxy.server(server) else {
            tracing::warn!(server, discarded = joins.len(), "server is no longer registered; discarding delayed joins");
            return 0;
        };

        for caller in joins {
            let notice = Notice::Connecting {
                server: server.to_owned(),
            };
            self.proxy.notify(caller, notice).await;
            self.proxy.connect(caller, &handle).await;
        }
        joins.len()
    }

    // ---- subscriptions ---------------------------------------------------

    /// Queues `caller` to be connected to `server` once it is ready.
    ///
    /// Replaces any previous target of `caller`. The caller is told
    /// [`Notice::AddedToJoinList`], or [`Notice::AlreadyQueued`] if it already
    /// waited for `server`.
    pub async fn set_delayed_join(&self, caller: P::Caller, server: &str) -> Placement {
        let placement = self.joins.set(caller.clone(), server);
        let notice = match placement {
            Placement::AlreadyQueued => Notice::AlreadyQueued {
                server: server.to_owned(),
            },
            Placement::Added | Placement::Replaced { .. } => Notice::AddedToJoinList {
                server: server.to_owned(),
            },
        };
        self.proxy.notify(&caller, notice).await;
        placement
    }

    /// Removes the delayed join of `caller`; returns the server it waited for.
    pub fn cancel_delayed_join(&self, caller: &P::Caller) -> Option<String> {
        self.joins.cancel(caller)
    }

    /// Subscribes `caller` to the outcome of the next attempt for `server`.
    ///
    /// Placing is silent, except that a caller already subscribed to `server`
    /// is told [`Notice::AlreadyQueued`].
    pub async fn set_notification(&self, caller: P::Caller, server: &str) -> Placement {
        let placement = self.listeners.set(caller.clone(), server);
        if placement == Placement::AlreadyQueued {
            let notice = Notice::AlreadyQueued {
                server: server.to_owned(),
            };
            self.proxy.notify(&caller, notice).await;
        }
        placement
    }

    /// Removes the notification subscription of `caller`.
    pub fn cancel_notification(&self, caller: &P::Caller) -> Option<String> {
        self.listeners.cancel(caller)
    }

    // ---- queries ---------------------------------------------------------

    /// True if a boot attempt for `server` is in flight.
    pub fn is_booting(&self, server: &str) -> bool {
        self.booting.is_booting(server)
    }

    /// Runs a single bounded reachability check against `server`.
    pub async fn is_online(&self, server: &str) -> bool {
        poller::probe_once(server, self.probe(server), self.cfg.probe_limit()).await
    }

    /// Sorted names of servers with an attempt in flight.
    pub fn booting(&self) -> Vec<String> {
        self.booting.snapshot()
    }

    /// Delayed join registry.
    pub fn joins(&self) -> &TargetRegistry<P::Caller> {
        &self.joins
    }

    /// Notification registry.
    pub fn listeners(&self) -> &TargetRegistry<P::Caller> {
        &self.listeners
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// The proxy this orchestrator works against.
    pub fn proxy(&self) -> &Arc<P> {
        &self.proxy
    }

    /// The launcher used to resolve and start boot commands.
    pub fn launcher(&self) -> &Arc<dyn Launcher> {
        &self.launcher
    }

    /// Receives lifecycle events published after this call.
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Stops forwarding events to observers. In-flight attempts keep running.
    pub fn shutdown(&self) {
        self.runtime_token.cancel();
    }
}
