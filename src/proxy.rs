//! # Proxy seam: the server directory and the callers behind it.
//!
//! The orchestrator never talks to the network. Everything it needs from the
//! surrounding proxy goes through [`Proxy`]:
//!
//! | Capability        | Method              | Failure handling                         |
//! |-------------------|---------------------|------------------------------------------|
//! | server directory  | [`Proxy::server`]   | `None` = unknown server                  |
//! | listing           | [`Proxy::servers`]  | -                                        |
//! | reachability      | [`Proxy::ping`]     | `Err` counts as "not reachable"          |
//! | connect a caller  | [`Proxy::connect`]  | implementor's concern (fire-and-forget)  |
//! | tell a caller     | [`Proxy::notify`]   | implementor's concern (fire-and-forget)  |
//!
//! Caller-facing messages are typed as [`Notice`]. Each notice has a stable
//! dotted [`key`](Notice::key) for translation tables and an English
//! `Display` fallback.

use std::fmt;
use std::hash::Hash;

use async_trait::async_trait;

use crate::core::BootOutcome;

/// Directory of servers and the callers that ask for them.
#[async_trait]
pub trait Proxy: Send + Sync + 'static {
    /// Caller identity (a connected client, a console, ...).
    type Caller: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;
    /// Live handle to a registered server.
    type Server: Send + Sync + 'static;

    /// Names of all registered servers.
    fn servers(&self) -> Vec<String>;

    /// Resolves `name` to a live handle, or `None` if it is not registered.
    fn server(&self, name: &str) -> Option<Self::Server>;

    /// Checks whether `server` currently accepts connections.
    ///
    /// May be slow or fail; the orchestrator bounds it and treats errors as "not reachable".
    async fn ping(&self, server: &Self::Server) -> anyhow::Result<bool>;

    /// Connects `caller` to `server`.
    async fn connect(&self, caller: &Self::Caller, server: &Self::Server);

    /// Delivers `notice` to `caller`.
    async fn notify(&self, caller: &Self::Caller, notice: Notice);
}

/// Message delivered to a caller through [`Proxy::notify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A boot attempt was admitted for `server`.
    Starting {
        /// Target server.
        server: String,
    },
    /// The caller will be connected once `server` is ready.
    AddedToJoinList {
        /// Target server.
        server: String,
    },
    /// The caller was already queued for `server`; nothing changed.
    AlreadyQueued {
        /// Target server.
        server: String,
    },
    /// The caller is about to be connected to `server`.
    Connecting {
        /// Target server.
        server: String,
    },
    /// The boot attempt for `server` concluded.
    Finished {
        /// Target server.
        server: String,
        /// How it concluded.
        outcome: BootOutcome,
    },
}

impl Notice {
    /// Stable message key for translation lookups.
    pub fn key(&self) -> &'static str {
        match self {
            Notice::Starting { .. } => "server_startup.starting",
            Notice::AddedToJoinList { .. } => "server_startup.added_to_join_list",
            Notice::AlreadyQueued { .. } => "server_startup.already_in_join_list",
            Notice::Connecting { .. } => "connecting_to_server",
            Notice::Finished { outcome, .. } => match outcome {
                BootOutcome::Success => "server_startup.script_result.success",
                BootOutcome::ScriptMissing => "server_startup.no_script_defined",
                _ => "server_startup.script_result.unknown_error",
            },
        }
    }

    /// Server the notice is about.
    pub fn server(&self) -> &str {
        match self {
            Notice::Starting { server }
            | Notice::AddedToJoinList { server }
            | Notice::AlreadyQueued { server }
            | Notice::Connecting { server }
            | Notice::Finished { server, .. } => server,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Starting { server } => write!(f, "Starting server {server}..."),
            Notice::AddedToJoinList { server } => {
                write!(f, "You will be connected to {server} once it has started.")
            }
            Notice::AlreadyQueued { server } => {
                write!(f, "You are already waiting to join {server}.")
            }
            Notice::Connecting { server } => write!(f, "Connecting you to {server}..."),
            Notice::Finished { server, outcome } => match outcome {
                BootOutcome::Success => write!(f, "Server {server} is online."),
                BootOutcome::ScriptMissing => {
                    write!(f, "Server {server} has no startup script defined.")
                }
                other => write!(f, "Server {server} failed to start ({other})."),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_follow_outcome() {
        let ok = Notice::Finished {
            server: "survival".into(),
            outcome: BootOutcome::Success,
        };
        let missing = Notice::Finished {
            server: "survival".into(),
            outcome: BootOutcome::ScriptMissing,
        };
        let timeout = Notice::Finished {
            server: "survival".into(),
            outcome: BootOutcome::Timeout,
        };

        assert_eq!(ok.key(), "server_startup.script_result.success");
        assert_eq!(missing.key(), "server_startup.no_script_defined");
        assert_eq!(timeout.key(), "server_startup.script_result.unknown_error");
        assert_eq!(timeout.server(), "survival");
    }

    #[test]
    fn test_display_mentions_failure_reason() {
        let n = Notice::Finished {
            server: "lobby".into(),
            outcome: BootOutcome::NonZeroExit(3),
        };
        let text = n.to_string();
        assert!(text.contains("lobby"));
        assert!(text.contains("non_zero_exit(3)"));
    }
}
