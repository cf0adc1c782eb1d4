//! Error types used by the bootvisor runtime.
//!
//! This module defines three error enums:
//!
//! - [`BootError`]: failures surfaced synchronously to the code path that initiated a boot.
//! - [`ControlError`]: failures of the command-level compositions (`start`, `join`, `info`).
//! - [`ConfigError`]: failures while loading or validating a [`Config`](crate::Config).
//!
//! All types provide `as_label` for logging/metrics.
//! Asynchronous outcomes (non-zero exit, timeout) are **not** errors here:
//! they are delivered through the notification fan-out as a [`BootOutcome`](crate::BootOutcome).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// # Errors produced when a boot attempt cannot be started.
///
/// Only these two kinds reach the immediate caller; every other failure is
/// asynchronous and only observable through notifications.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BootError {
    /// The boot script for the server does not exist.
    #[error("no startup script for server '{server}' (expected at {})", path.display())]
    ScriptMissing {
        /// Server that was asked to boot.
        server: String,
        /// Path that was probed.
        path: PathBuf,
    },

    /// The OS refused to start the boot process.
    #[error("failed to launch startup script for server '{server}': {source}")]
    Launch {
        /// Server that was asked to boot.
        server: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl BootError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use bootvisor::BootError;
    ///
    /// let err = BootError::ScriptMissing { server: "lobby".into(), path: "scripts/start_lobby.sh".into() };
    /// assert_eq!(err.as_label(), "boot_script_missing");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BootError::ScriptMissing { .. } => "boot_script_missing",
            BootError::Launch { .. } => "boot_launch_failed",
        }
    }

    /// Name of the server the failed attempt was for.
    pub fn server(&self) -> &str {
        match self {
            BootError::ScriptMissing { server, .. } | BootError::Launch { server, .. } => server,
        }
    }
}

/// # Errors produced by the command-level operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ControlError {
    /// The proxy does not know a server with this name.
    #[error("server '{server}' is not registered")]
    UnknownServer {
        /// Requested server name.
        server: String,
    },

    /// The boot attempt could not be started.
    #[error(transparent)]
    Boot(#[from] BootError),
}

impl ControlError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ControlError::UnknownServer { .. } => "control_unknown_server",
            ControlError::Boot(e) => e.as_label(),
        }
    }
}

/// # Errors produced while loading configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The config file is not valid TOML or has wrongly typed keys.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is syntactically fine but unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "config_io",
            ConfigError::Parse(_) => "config_parse",
            ConfigError::Invalid(_) => "config_invalid",
        }
    }
}
