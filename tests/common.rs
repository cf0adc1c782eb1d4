//! Common test utilities for integration tests.
//!
//! Provides two in-memory collaborators for the orchestrator:
//! - `MockProxy`: a server directory with scripted reachability that records
//!   every notice and connection it is asked to deliver
//! - `ScriptedLauncher`: pretends to run boot scripts, each one resolving with a
//!   fixed exit code after a fixed (virtual) delay
//!
//! Both are meant for `start_paused = true` tests: delays are tokio timers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bootvisor::{
    BootCommand, Config, Event, EventKind, ExitFuture, Launcher, Notice, Orchestrator, Proxy,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;

pub type Caller = &'static str;

/// Reachability of one registered server.
#[derive(Debug, Clone, Copy)]
pub enum Reach {
    /// Never answers.
    Never,
    /// Fails this many pings, then answers every time.
    After(u32),
    /// Answers the first ping, then disappears from the directory.
    OnceThenGone,
    /// Every ping hangs forever.
    Hangs,
}

#[derive(Debug)]
struct Node {
    reach: Reach,
    pings: u32,
}

/// In-memory proxy.
#[derive(Default)]
pub struct MockProxy {
    nodes: Mutex<HashMap<String, Node>>,
    notices: Mutex<Vec<(Caller, Notice)>>,
    connects: Mutex<Vec<(Caller, String)>>,
}

impl MockProxy {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_server(self: Arc<Self>, name: &str, reach: Reach) -> Arc<Self> {
        self.nodes.lock().insert(name.to_owned(), Node { reach, pings: 0 });
        self
    }

    pub fn pings(&self, name: &str) -> u32 {
        self.nodes.lock().get(name).map_or(0, |n| n.pings)
    }

    pub fn notices_for(&self, caller: Caller) -> Vec<Notice> {
        self.notices
            .lock()
            .iter()
            .filter(|(c, _)| *c == caller)
            .map(|(_, n)| n.clone())
            .collect()
    }

    pub fn connects(&self) -> Vec<(Caller, String)> {
        self.connects.lock().clone()
    }

    /// Counts a ping and decides its answer; `None` means it never answers.
    fn answer(&self, server: &str) -> anyhow::Result<Option<bool>> {
        let mut nodes = self.nodes.lock();
        let Some(node) = nodes.get_mut(server) else {
            anyhow::bail!("server {server} is not registered");
        };
        node.pings += 1;
        Ok(match node.reach {
            Reach::Never => Some(false),
            Reach::After(failures) => Some(node.pings > failures),
            Reach::OnceThenGone => {
                nodes.remove(server);
                Some(true)
            }
            Reach::Hangs => None,
        })
    }
}

#[async_trait]
impl Proxy for MockProxy {
    type Caller = Caller;
    type Server = String;

    fn servers(&self) -> Vec<String> {
        self.nodes.lock().keys().cloned().collect()
    }

    fn server(&self, name: &str) -> Option<String> {
        self.nodes.lock().contains_key(name).then(|| name.to_owned())
    }

    async fn ping(&self, server: &String) -> anyhow::Result<bool> {
        match self.answer(server)? {
            Some(reachable) => Ok(reachable),
            None => std::future::pending().await,
        }
    }

    async fn connect(&self, caller: &Caller, server: &String) {
        self.connects.lock().push((*caller, server.clone()));
    }

    async fn notify(&self, caller: &Caller, notice: Notice) {
        self.notices.lock().push((*caller, notice));
    }
}

/// How a scripted boot behaves.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    /// Runs for `after`, then exits with `code`.
    Exit { code: i32, after: Duration },
    /// The OS refuses to start it.
    LaunchFails,
}

impl Script {
    pub fn ok() -> Self {
        Script::Exit {
            code: 0,
            after: Duration::ZERO,
        }
    }

    pub fn exit(code: i32) -> Self {
        Script::Exit {
            code,
            after: Duration::ZERO,
        }
    }

    pub fn slow(after: Duration) -> Self {
        Script::Exit { code: 0, after }
    }
}

/// Launcher whose scripts are table entries.
#[derive(Default)]
pub struct ScriptedLauncher {
    scripts: Mutex<HashMap<String, Script>>,
    launches: AtomicUsize,
}

impl ScriptedLauncher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_script(self: Arc<Self>, server: &str, script: Script) -> Arc<Self> {
        self.scripts.lock().insert(server.to_owned(), script);
        self
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

impl Launcher for ScriptedLauncher {
    fn script_path(&self, server: &str) -> PathBuf {
        PathBuf::from(format!("scripts/start_{server}.sh"))
    }

    fn resolve(&self, server: &str) -> Option<BootCommand> {
        self.scripts.lock().contains_key(server).then(|| BootCommand {
            server: server.to_owned(),
            script: self.script_path(server),
            program: "sh".into(),
            args: vec![format!("start_{server}.sh")],
            workdir: PathBuf::from("scripts"),
        })
    }

    fn launch(&self, command: &BootCommand) -> io::Result<ExitFuture> {
        let script = self.scripts.lock().get(&command.server).copied();
        match script {
            Some(Script::Exit { code, after }) => {
                self.launches.fetch_add(1, Ordering::SeqCst);
                Ok(Box::pin(async move {
                    if !after.is_zero() {
                        tokio::time::sleep(after).await;
                    }
                    code
                }))
            }
            Some(Script::LaunchFails) | None => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            )),
        }
    }
}

/// Config with a 1 s poll interval and no per-probe timeout.
pub fn config(global_timeout: Duration) -> Config {
    Config {
        global_timeout,
        poll_interval: Duration::from_secs(1),
        probe_timeout: Duration::ZERO,
        ..Config::default()
    }
}

pub fn build(
    cfg: Config,
    proxy: &Arc<MockProxy>,
    launcher: &Arc<ScriptedLauncher>,
) -> Arc<Orchestrator<MockProxy>> {
    Orchestrator::builder(cfg, Arc::clone(proxy), Arc::clone(launcher)).build()
}

/// Waits for the next `BootResolved` event of `server`.
pub async fn resolved(rx: &mut broadcast::Receiver<Event>, server: &str) -> Event {
    loop {
        let ev = rx.recv().await.expect("event bus closed");
        if ev.kind == EventKind::BootResolved && ev.server.as_deref() == Some(server) {
            return ev;
        }
    }
}

pub fn finished(server: &str, outcome: bootvisor::BootOutcome) -> Notice {
    Notice::Finished {
        server: server.to_owned(),
        outcome,
    }
}
