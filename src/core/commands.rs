//! # Command-level compositions over the orchestrator.
//!
//! What a player or console actually asks for: list servers, inspect one,
//! start one, join one (booting it if needed), or stop waiting.
//!
//! ```text
//! start(caller, S) ─ unknown ─► Err(UnknownServer)
//!                  ─ online  ─► AlreadyOnline
//!                  ─ else    ─► start_server_with_notify(S, caller) ─► Started(admission)
//!
//! join(caller, S)  ─ unknown ─► Err(UnknownServer)
//!                  ─ online  ─► connect now ─────────────────────────► Connected
//!                  ─ else    ─► set_delayed_join + start_server_with_notify ─► Queued(admission)
//! ```

use std::sync::Arc;

use crate::{
    error::ControlError,
    proxy::{Notice, Proxy},
};

use super::{orchestrator::Orchestrator, outcome::Admission};

/// Snapshot of one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Answered a reachability check just now.
    pub online: bool,
    /// A boot attempt is in flight.
    pub booting: bool,
    /// A boot script exists.
    pub has_script: bool,
}

/// Answer of [`Orchestrator::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartReply {
    /// The server is already reachable; nothing was started.
    AlreadyOnline,
    /// A boot attempt was requested.
    Started(Admission),
}

/// Answer of [`Orchestrator::join`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinReply {
    /// The server was reachable and the caller was connected right away.
    Connected,
    /// The caller waits for the server; a boot attempt was requested.
    Queued(Admission),
}

impl<P: Proxy> Orchestrator<P> {
    /// Sorted names of all registered servers.
    pub fn servers(&self) -> Vec<String> {
        let mut names = self.proxy().servers();
        names.sort_unstable();
        names
    }

    /// Describes `name`.
    ///
    /// # Errors
    /// [`ControlError::UnknownServer`] if the proxy does not know `name`.
    pub async fn info(&self, name: &str) -> Result<ServerInfo, ControlError> {
        self.ensure_known(name)?;
        Ok(ServerInfo {
            name: name.to_owned(),
            online: self.is_online(name).await,
            booting: self.is_booting(name),
            has_script: self.launcher().resolve(name).is_some(),
        })
    }

    /// Starts `name` on behalf of `caller`, who is told the outcome.
    ///
    /// # Errors
    /// [`ControlError::UnknownServer`] or the boot error of the attempt.
    pub async fn start(self: &Arc<Self>, caller: P::Caller, name: &str) -> Result<StartReply, ControlError> {
        self.ensure_known(name)?;
        if self.is_online(name).await {
            tracing::debug!(server = name, caller = ?caller, "start requested for a server that is already online");
            return Ok(StartReply::AlreadyOnline);
        }
        let admission = self.start_server_with_notify(name, caller).await?;
        Ok(StartReply::Started(admission))
    }

    /// Connects `caller` to `name`, booting it first if it is not reachable.
    ///
    /// # Errors
    /// [`ControlError::UnknownServer`] or the boot error of the attempt.
    pub async fn join(self: &Arc<Self>, caller: P::Caller, name: &str) -> Result<JoinReply, ControlError> {
        let Some(handle) = self.proxy().server(name) else {
            return Err(ControlError::UnknownServer {
                server: name.to_owned(),
            });
        };

        if self.is_online(name).await {
            let notice = Notice::Connecting {
                server: name.to_owned(),
            };
            self.proxy().notify(&caller, notice).await;
            self.proxy().connect(&caller, &handle).await;
            return Ok(JoinReply::Connected);
        }

        self.set_delayed_join(caller.clone(), name).await;
        let admission = self.start_server_with_notify(name, caller).await?;
        Ok(JoinReply::Queued(admission))
    }

    /// Stops `caller` from waiting: drops both its delayed join and its notification.
    ///
    /// Returns true if either existed.
    pub fn cancel_join(&self, caller: &P::Caller) -> bool {
        let join = self.cancel_delayed_join(caller);
        let notification = self.cancel_notification(caller);
        join.is_some() || notification.is_some()
    }

    fn ensure_known(&self, name: &str) -> Result<(), ControlError> {
        match self.proxy().server(name) {
            Some(_) => Ok(()),
            None => Err(ControlError::UnknownServer {
                server: name.to_owned(),
            }),
        }
    }
}
