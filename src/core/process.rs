//! # Process runner: launch an external program and await its exit code.
//!
//! [`run`] spawns a program and hands back an [`ExitFuture`] that resolves
//! exactly once with the exit code.
//!
//! ## Flow
//! ```text
//! run(cmd, workdir, output)
//!   ├─ spawn() fails ──► Err(io::Error)            (synchronous, no future)
//!   └─ spawn() ok
//!        ├─ OutputMode::Log  ──► drain stdout ─► log "SCRIPT-OUT" (own task)
//!        │                   └─► drain stderr ─► log "SCRIPT-ERR" (own task)
//!        └─► ExitFuture ─► child.wait() ─► exit code
//! ```
//!
//! ## Rules
//! - No timeout is applied here; a hung program keeps its future pending.
//! - Drain failures are logged and never affect the exit code.
//! - Output that is not valid UTF-8 is forwarded lossily; it never ends the drain.
//! - Termination without a code (signal) or a failed wait resolves to [`UNKNOWN_EXIT_CODE`].

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Exit code reported when the process ended without one.
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// Future resolving with the exit code of a launched process.
pub type ExitFuture = BoxFuture<'static, i32>;

/// What to do with the program's stdout/stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Discard both streams.
    Discard,
    /// Forward every line to the log, tagged with `label` and the stream of origin.
    Log {
        /// Usually the server name.
        label: Arc<str>,
    },
}

/// Which stream a drained line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl Stream {
    /// Tag used in log records.
    pub fn tag(self) -> &'static str {
        match self {
            Stream::Stdout => "SCRIPT-OUT",
            Stream::Stderr => "SCRIPT-ERR",
        }
    }
}

/// Launches `program args..` inside `workdir`.
///
/// Must be called inside a tokio runtime (drain tasks are spawned on it).
///
/// # Errors
/// Returns the OS error if the program cannot be started.
pub fn run(program: &str, args: &[String], workdir: &Path, output: OutputMode) -> io::Result<ExitFuture> {
    let piped = matches!(output, OutputMode::Log { .. });
    let stdio = || if piped { Stdio::piped() } else { Stdio::null() };

    let mut child = Command::new(program)
        .args(args)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(stdio())
        .stderr(stdio())
        .spawn()?;

    if let OutputMode::Log { label } = output {
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(drain_lines(stdout, Stream::Stdout, Arc::clone(&label)));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_lines(stderr, Stream::Stderr, label));
        }
    }

    let program = program.to_owned();
    Ok(Box::pin(async move {
        match child.wait().await {
            Ok(status) => status.code().unwrap_or_else(|| {
                tracing::warn!(program, %status, "process terminated without an exit code");
                UNKNOWN_EXIT_CODE
            }),
            Err(e) => {
                tracing::error!(program, error = %e, "failed to wait for process");
                UNKNOWN_EXIT_CODE
            }
        }
    }))
}

/// Forwards each line of `reader` to the log until EOF or a read error.
async fn drain_lines<R>(reader: R, stream: Stream, label: Arc<str>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).split(b'\n');
    loop {
        match lines.next_segment().await {
            Ok(Some(bytes)) => {
                let line = String::from_utf8_lossy(&bytes);
                let line = line.trim_end_matches('\r');
                tracing::info!(target: "bootvisor::script", server = %label, stream = stream.tag(), "{line}");
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!(
                    target: "bootvisor::script",
                    server = %label,
                    stream = stream.tag(),
                    error = %e,
                    "error reading script output stream"
                );
                break;
            }
        }
    }
}
