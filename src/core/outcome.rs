//! # Results of admission and of whole boot attempts.
//!
//! - [`Admission`] is what `start_server` answers synchronously.
//! - [`BootOutcome`] is produced **once** per boot attempt and consumed by resolution.
//!
//! ```text
//! start_server(S)
//!   ├─ AlreadyBooting ─────────────────────────────► (no attempt)
//!   ├─ Err(ScriptMissing) ──► resolve(ScriptMissing)
//!   ├─ Err(Launch) ─────────► resolve(LaunchError)
//!   └─ Started ─► exit != 0 ─► resolve(NonZeroExit(code))
//!                 exit == 0 ─► poll ─► Ready ────► resolve(Success)
//!                                   └► TimedOut ─► resolve(Timeout)
//! ```

use std::fmt;

/// Synchronous answer of a successful `start_server` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A new boot attempt was started.
    Started,
    /// An attempt for this server is already in flight; nothing new was started.
    AlreadyBooting,
}

/// Terminal outcome of one boot attempt. Never retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    /// The script succeeded and the server answered a reachability probe.
    Success,
    /// No boot script exists for the server.
    ScriptMissing,
    /// The OS could not start the script.
    LaunchError,
    /// The script ran and reported failure.
    NonZeroExit(i32),
    /// The script succeeded but the server never became reachable in time.
    Timeout,
}

impl BootOutcome {
    /// True only for [`BootOutcome::Success`].
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, BootOutcome::Success)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BootOutcome::Success => "success",
            BootOutcome::ScriptMissing => "script_missing",
            BootOutcome::LaunchError => "launch_error",
            BootOutcome::NonZeroExit(_) => "non_zero_exit",
            BootOutcome::Timeout => "timeout",
        }
    }
}

impl fmt::Display for BootOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootOutcome::NonZeroExit(code) => write!(f, "non_zero_exit({code})"),
            other => f.write_str(other.as_label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_success_is_success() {
        assert!(BootOutcome::Success.is_success());
        for outcome in [
            BootOutcome::ScriptMissing,
            BootOutcome::LaunchError,
            BootOutcome::NonZeroExit(1),
            BootOutcome::Timeout,
        ] {
            assert!(!outcome.is_success(), "{outcome} must be a failure");
        }
    }

    #[test]
    fn test_display_carries_exit_code() {
        assert_eq!(BootOutcome::NonZeroExit(3).to_string(), "non_zero_exit(3)");
        assert_eq!(BootOutcome::Timeout.to_string(), "timeout");
    }
}
