//! # Boot command resolution and launching.
//!
//! [`Launcher`] is the seam between the orchestrator and the outside world for
//! *starting* servers: it knows where a server's boot command lives and how to
//! run it. [`ScriptLauncher`] is the file-based implementation driven by
//! [`Config`]: one script per server, run through an execution template.
//!
//! ```text
//! resolve("survival")
//!   └─► scripts_dir / "start_%server%.sh" ─► scripts/start_survival.sh
//!         ├─ missing ─► None
//!         └─ exists  ─► BootCommand { program: "sh", args: ["start_survival.sh"], workdir: "scripts" }
//! launch(cmd) ─► process::run(..) ─► ExitFuture
//! ```

use std::io;
use std::path::{Path, PathBuf};

use crate::config::{Config, SCRIPT_FILE_PLACEHOLDER, SERVER_PLACEHOLDER};
use crate::core::process::{self, ExitFuture, OutputMode};

/// Fully resolved boot command of one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootCommand {
    /// Server the command boots.
    pub server: String,
    /// Script (or other artifact) that must exist for the command to be valid.
    pub script: PathBuf,
    /// Program to execute.
    pub program: String,
    /// Program arguments.
    pub args: Vec<String>,
    /// Working directory of the process.
    pub workdir: PathBuf,
}

/// Resolves and launches boot commands.
pub trait Launcher: Send + Sync + 'static {
    /// Path the boot artifact of `server` is expected at, whether or not it exists.
    fn script_path(&self, server: &str) -> PathBuf;

    /// Returns the boot command of `server`, or `None` if its artifact does not exist.
    fn resolve(&self, server: &str) -> Option<BootCommand>;

    /// Starts `command`.
    ///
    /// # Errors
    /// Returns the OS error if the process cannot be started. Once this returns
    /// `Ok`, the future resolves exactly once with the exit code.
    fn launch(&self, command: &BootCommand) -> io::Result<ExitFuture>;
}

/// File-based launcher: `scripts_dir/script_pattern`, run through `execution`.
#[derive(Debug, Clone)]
pub struct ScriptLauncher {
    scripts_dir: PathBuf,
    script_pattern: String,
    execution: String,
    redirect_output: bool,
}

impl ScriptLauncher {
    /// Builds a launcher from the script settings of `cfg`.
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            scripts_dir: cfg.scripts_dir.clone(),
            script_pattern: cfg.script_pattern.clone(),
            execution: cfg.execution.clone(),
            redirect_output: cfg.redirect_output,
        }
    }

    /// Splits the execution template into program and arguments for `script`.
    ///
    /// An empty template runs the script itself.
    fn command_line(&self, script: &Path) -> (String, Vec<String>) {
        let file_name = script
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut tokens = self
            .execution
            .split_whitespace()
            .map(|token| token.replace(SCRIPT_FILE_PLACEHOLDER, &file_name));

        match tokens.next() {
            Some(program) => (program, tokens.collect()),
            None => (script.to_string_lossy().into_owned(), Vec::new()),
        }
    }
}

impl Launcher for ScriptLauncher {
    fn script_path(&self, server: &str) -> PathBuf {
        self.scripts_dir
            .join(self.script_pattern.replace(SERVER_PLACEHOLDER, server))
    }

    fn resolve(&self, server: &str) -> Option<BootCommand> {
        let script = self.script_path(server);
        if !script.is_file() {
            return None;
        }

        let workdir = match script.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let (program, args) = self.command_line(&script);

        Some(BootCommand {
            server: server.to_owned(),
            script,
            program,
            args,
            workdir,
        })
    }

    fn launch(&self, command: &BootCommand) -> io::Result<ExitFuture> {
        let output = if self.redirect_output {
            OutputMode::Log {
                label: command.server.as_str().into(),
            }
        } else {
            OutputMode::Discard
        };
        process::run(&command.program, &command.args, &command.workdir, output)
    }
}
