//! Runtime core: admission, boot attempts and resolution.
//!
//! The main public API from this module is [`Orchestrator`], which admits boot
//! requests, drives each attempt to a [`BootOutcome`], and resolves the callers
//! waiting on it.
//!
//! Internal modules:
//! - [`process`]: launches a program and awaits its exit code, draining its output;
//! - [`launcher`]: resolves a server's boot command and launches it;
//! - [`admission`]: one attempt per server, released through an RAII slot;
//! - [`subscriptions`]: single-slot caller → server registries;
//! - [`poller`]: readiness polling bounded by a deadline;
//! - [`orchestrator`]: the attempt state machine and resolution fan-out;
//! - [`commands`]: start/join/info/list compositions.

mod admission;
mod builder;
mod commands;
mod launcher;
mod orchestrator;
mod outcome;
mod poller;
mod process;
mod subscriptions;

pub use admission::{BootRegistry, BootSlot};
pub use builder::OrchestratorBuilder;
pub use commands::{JoinReply, ServerInfo, StartReply};
pub use launcher::{BootCommand, Launcher, ScriptLauncher};
pub use orchestrator::Orchestrator;
pub use outcome::{Admission, BootOutcome};
pub use poller::{PollPolicy, Readiness, await_ready};
pub use process::{ExitFuture, OutputMode, Stream, UNKNOWN_EXIT_CODE, run};
pub use subscriptions::{Placement, TargetRegistry};
