//! # bootvisor
//!
//! **Bootvisor** boots backend servers on demand behind a proxy.
//!
//! It launches a server's external boot script, waits until the server answers a
//! reachability probe, and resolves every caller that was waiting for it: queued
//! callers are connected, listening callers are told the outcome. At most one
//! boot attempt per server is in flight, and every attempt cleans up after itself
//! whether it succeeds, fails to launch, exits non-zero or times out.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   start / join / info / cancel_join            (commands, per caller)
//!            │
//!            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator                                                     │
//! │  - BootRegistry (one attempt per server, BootSlot guard)          │
//! │  - joins:     TargetRegistry<Caller>  (connect when ready)        │
//! │  - listeners: TargetRegistry<Caller>  (tell the outcome)          │
//! │  - Bus (broadcast lifecycle events)                               │
//! └──────┬─────────────────────────┬─────────────────────────┬────────┘
//!        ▼                         ▼                         ▼
//!   Launcher::launch         await_ready(probe)        Proxy::notify / connect
//!   (process runner)         (Proxy::ping, ticks)      (resolution fan-out)
//!        │                         │                         │
//!        └──── publish(Event) ─────┴──────── publish ────────┘
//!                                  ▼
//!                     Bus ──► listener ──► SubscriberSet ──► observers
//! ```
//!
//! ### Lifecycle of one attempt
//! ```text
//! start_server(S)
//!   ├─ already booting ──► AlreadyBooting
//!   ├─ no script ────────► resolve(ScriptMissing), Err
//!   ├─ launch fails ─────► resolve(LaunchError), Err
//!   └─ launched ─────────► Started
//!         exit != 0 ──► resolve(NonZeroExit(code))
//!         exit == 0 ──► poll every interval until ready or now + timeout_for(S)
//!                         ├─ ready    ──► resolve(Success)
//!                         └─ deadline ──► resolve(Timeout)
//!
//! resolve: notify drained listeners ─► connect (success) or discard drained joins
//!          ─► publish BootResolved ─► release S
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Orchestration** | Admit, run and resolve boot attempts.                         | [`Orchestrator`], [`BootOutcome`]          |
//! | **Commands**      | Start, join, inspect and list servers on behalf of a caller.  | [`StartReply`], [`JoinReply`], [`ServerInfo`] |
//! | **Seams**         | Plug in the proxy and the way servers are booted.             | [`Proxy`], [`Launcher`], [`ScriptLauncher`] |
//! | **Observers**     | Hook into lifecycle events (logging, metrics, audits).        | [`Subscribe`], [`Event`]                   |
//! | **Errors**        | Typed errors for immediate failures and configuration.        | [`BootError`], [`ControlError`], [`ConfigError`] |
//! | **Configuration** | Timeouts, polling cadence, script layout; TOML loading.       | [`Config`]                                 |
//!
//! ## Optional features
//! - `logging` (default): exports a built-in [`LogWriter`] observer.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use bootvisor::{Config, Notice, Orchestrator, Proxy, ScriptLauncher};
//!
//! struct Directory;
//!
//! #[async_trait]
//! impl Proxy for Directory {
//!     type Caller = String;
//!     type Server = String;
//!
//!     fn servers(&self) -> Vec<String> { vec!["survival".into()] }
//!     fn server(&self, name: &str) -> Option<String> {
//!         (name == "survival").then(|| name.to_owned())
//!     }
//!     async fn ping(&self, _server: &String) -> anyhow::Result<bool> { Ok(true) }
//!     async fn connect(&self, caller: &String, server: &String) {
//!         println!("{caller} -> {server}");
//!     }
//!     async fn notify(&self, caller: &String, notice: Notice) {
//!         println!("[{caller}] {notice}");
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::load_from("bootvisor.toml")?;
//!     let launcher = Arc::new(ScriptLauncher::from_config(&cfg));
//!
//!     let orch = Orchestrator::builder(cfg, Arc::new(Directory), launcher).build();
//!     orch.join("steve".to_owned(), "survival").await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod proxy;
mod subscribers;

// ---- Public re-exports ----

pub use config::{Config, SCRIPT_FILE_PLACEHOLDER, SERVER_PLACEHOLDER};
pub use core::{
    Admission, BootCommand, BootOutcome, BootRegistry, BootSlot, ExitFuture, JoinReply, Launcher, Orchestrator,
    OrchestratorBuilder, OutputMode, Placement, PollPolicy, Readiness, ScriptLauncher, ServerInfo, StartReply, Stream,
    TargetRegistry, UNKNOWN_EXIT_CODE, await_ready, run,
};
pub use error::{BootError, ConfigError, ControlError};
pub use events::{Bus, Event, EventKind};
pub use proxy::{Notice, Proxy};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger observer.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
