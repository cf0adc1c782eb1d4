//! # Global runtime configuration.
//!
//! [`Config`] defines how boot attempts are launched and how long the
//! orchestrator waits for a booted server to become reachable.
//!
//! Config is used in three places:
//! 1. **Launching**: [`ScriptLauncher::from_config`](crate::ScriptLauncher::from_config)
//!    reads the script location and execution template.
//! 2. **Polling**: the orchestrator derives the deadline from [`Config::timeout_for`]
//!    and the cadence from [`Config::poll_policy`].
//! 3. **Events**: [`Config::bus_capacity`] sizes the broadcast bus.
//!
//! ## Sentinel values
//! - `probe_timeout = 0s` → no per-probe bound; the readiness deadline still cuts a hung probe off.
//!
//! ## File format
//! ```toml
//! [server_startup]
//! global_timeout = 60
//! polling_delay = 2
//! probe_timeout = 5
//! script_pattern = "start_%server%.sh"
//!
//! [server_startup.server_timeouts]
//! survival = 120
//!
//! [scripts]
//! dir = "scripts"
//! execution = "sh %scriptFile%"
//! use_output_redirect = true
//! ```
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use bootvisor::Config;
//!
//! let cfg = Config::from_toml_str(r#"
//!     [server_startup]
//!     global_timeout = 10
//!
//!     [server_startup.server_timeouts]
//!     survival = 3
//! "#).unwrap();
//!
//! assert_eq!(cfg.timeout_for("survival"), Duration::from_secs(3));
//! assert_eq!(cfg.timeout_for("lobby"), Duration::from_secs(10));
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::core::PollPolicy;
use crate::error::ConfigError;

/// Placeholder replaced by the server name in [`Config::script_pattern`].
pub const SERVER_PLACEHOLDER: &str = "%server%";

/// Placeholder replaced by the script file name in [`Config::execution`].
pub const SCRIPT_FILE_PLACEHOLDER: &str = "%scriptFile%";

/// Global configuration for the orchestrator.
///
/// ## Field semantics
/// - `global_timeout`: time a booted server gets to become reachable
/// - `server_timeouts`: per-server overrides of `global_timeout`
/// - `poll_interval`: spacing between reachability probes (must be `> 0`)
/// - `probe_timeout`: upper bound for one probe (`0s` = only the deadline bounds it)
/// - `scripts_dir`, `script_pattern`: where the boot script of a server lives
/// - `execution`: command line used to run the script
/// - `redirect_output`: forward script stdout/stderr lines to the log
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct Config {
    /// Default readiness deadline, measured from the moment the boot script exits with `0`.
    pub global_timeout: Duration,

    /// Readiness deadline overrides keyed by server name.
    pub server_timeouts: HashMap<String, Duration>,

    /// Interval between two reachability probes.
    pub poll_interval: Duration,

    /// Maximum duration of a single reachability probe.
    ///
    /// A probe that does not answer in time counts as "not reachable" for that
    /// round; polling continues on the next tick.
    pub probe_timeout: Duration,

    /// Directory containing the boot scripts.
    pub scripts_dir: PathBuf,

    /// File name pattern of a boot script; `%server%` is replaced by the server name.
    pub script_pattern: String,

    /// Command line that runs a script; `%scriptFile%` is replaced by the script's file name.
    ///
    /// Tokenized on whitespace. The process runs inside the script's directory.
    pub execution: String,

    /// Forward the script's stdout/stderr to the log, line by line.
    pub redirect_output: bool,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the readiness deadline for `server`: its override if configured, else the global one.
    pub fn timeout_for(&self, server: &str) -> Duration {
        self.server_timeouts
            .get(server)
            .copied()
            .unwrap_or(self.global_timeout)
    }

    /// Returns the per-probe timeout as an `Option`.
    ///
    /// - `None` → no per-probe bound (the poller still stops at its deadline)
    /// - `Some(d)` → each probe is bounded by `d`
    #[inline]
    pub fn probe_limit(&self) -> Option<Duration> {
        if self.probe_timeout == Duration::ZERO {
            None
        } else {
            Some(self.probe_timeout)
        }
    }

    /// Returns the polling cadence used by the readiness poller.
    #[inline]
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.poll_interval,
            probe_timeout: self.probe_limit(),
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Parses a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    /// - [`ConfigError::Parse`] if the document is not valid TOML or a key has the wrong type
    /// - [`ConfigError::Invalid`] if a value is out of range (e.g. `polling_delay = 0`)
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        let cfg = file.into_config();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise see
    /// [`Config::from_toml_str`].
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval == Duration::ZERO {
            return Err(ConfigError::Invalid(
                "server_startup.polling_delay must be greater than 0".into(),
            ));
        }
        if self.script_pattern.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "server_startup.script_pattern must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `global_timeout = 60s`
    /// - `server_timeouts = {}`
    /// - `poll_interval = 2s`
    /// - `probe_timeout = 5s`
    /// - `scripts_dir = "scripts"`, `script_pattern = "start_%server%.sh"`
    /// - `execution = "sh %scriptFile%"`, `redirect_output = true`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            global_timeout: Duration::from_secs(60),
            server_timeouts: HashMap::new(),
            poll_interval: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(5),
            scripts_dir: PathBuf::from("scripts"),
            script_pattern: format!("start_{SERVER_PLACEHOLDER}.sh"),
            execution: format!("sh {SCRIPT_FILE_PLACEHOLDER}"),
            redirect_output: true,
            bus_capacity: 1024,
        }
    }
}

/// On-disk layout. Durations are whole seconds.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    server_startup: StartupSection,
    scripts: ScriptsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StartupSection {
    global_timeout: Option<u64>,
    polling_delay: Option<u64>,
    probe_timeout: Option<u64>,
    script_pattern: Option<String>,
    server_timeouts: HashMap<String, u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScriptsSection {
    dir: Option<PathBuf>,
    execution: Option<String>,
    use_output_redirect: Option<bool>,
}

impl ConfigFile {
    fn into_config(self) -> Config {
        let mut cfg = Config::default();
        let startup = self.server_startup;
        let scripts = self.scripts;

        if let Some(secs) = startup.global_timeout {
            cfg.global_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = startup.polling_delay {
            cfg.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = startup.probe_timeout {
            cfg.probe_timeout = Duration::from_secs(secs);
        }
        if let Some(pattern) = startup.script_pattern {
            cfg.script_pattern = pattern;
        }
        cfg.server_timeouts = startup
            .server_timeouts
            .into_iter()
            .map(|(name, secs)| (name, Duration::from_secs(secs)))
            .collect();

        if let Some(dir) = scripts.dir {
            cfg.scripts_dir = dir;
        }
        if let Some(execution) = scripts.execution {
            cfg.execution = execution;
        }
        if let Some(redirect) = scripts.use_output_redirect {
            cfg.redirect_output = redirect;
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_keeps_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg.global_timeout, Duration::from_secs(60));
        assert_eq!(cfg.poll_interval, Duration::from_secs(2));
        assert_eq!(cfg.execution, "sh %scriptFile%");
        assert!(cfg.redirect_output);
        assert!(cfg.server_timeouts.is_empty());
    }

    #[test]
    fn test_full_document() {
        let cfg = Config::from_toml_str(
            r#"
            [server_startup]
            global_timeout = 90
            polling_delay = 1
            probe_timeout = 0
            script_pattern = "%server%/boot.sh"

            [server_startup.server_timeouts]
            survival = 120
            creative = 15

            [scripts]
            dir = "/srv/scripts"
            execution = "bash %scriptFile% --quiet"
            use_output_redirect = false
            "#,
        )
        .unwrap();

        assert_eq!(cfg.global_timeout, Duration::from_secs(90));
        assert_eq!(cfg.poll_interval, Duration::from_secs(1));
        assert_eq!(cfg.probe_limit(), None);
        assert_eq!(cfg.timeout_for("survival"), Duration::from_secs(120));
        assert_eq!(cfg.timeout_for("creative"), Duration::from_secs(15));
        assert_eq!(cfg.timeout_for("lobby"), Duration::from_secs(90));
        assert_eq!(cfg.scripts_dir, PathBuf::from("/srv/scripts"));
        assert_eq!(cfg.script_pattern, "%server%/boot.sh");
        assert_eq!(cfg.execution, "bash %scriptFile% --quiet");
        assert!(!cfg.redirect_output);
    }

    #[test]
    fn test_zero_polling_delay_rejected() {
        let err = Config::from_toml_str("[server_startup]\npolling_delay = 0\n").unwrap_err();
        assert_eq!(err.as_label(), "config_invalid");
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let err = Config::from_toml_str("[server_startup]\nglobal_timeout = \"soon\"\n").unwrap_err();
        assert_eq!(err.as_label(), "config_parse");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::load_from("/definitely/not/here/bootvisor.toml").unwrap_err();
        assert_eq!(err.as_label(), "config_io");
    }

    #[test]
    fn test_default_script_location() {
        let cfg = Config::default();
        assert_eq!(cfg.scripts_dir, PathBuf::from("scripts"));
        assert_eq!(cfg.script_pattern, "start_%server%.sh");
        assert_eq!(cfg.bus_capacity_clamped(), 1024);
    }

    #[test]
    fn test_huge_timeout_is_accepted() {
        let cfg = Config::from_toml_str("[server_startup]\nglobal_timeout = 9223372036854775807\n").unwrap();
        assert_eq!(cfg.timeout_for("survival"), Duration::from_secs(i64::MAX as u64));
    }
}
