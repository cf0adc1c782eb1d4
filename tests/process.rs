//! Process runner and script launcher against real `sh` scripts.
#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bootvisor::{
    BootError, BootOutcome, Config, EventKind, Launcher, Notice, Orchestrator, OutputMode, Proxy, ScriptLauncher,
    UNKNOWN_EXIT_CODE, run,
};
use parking_lot::Mutex;

fn write_script(dir: &Path, server: &str, body: &str) {
    fs::write(dir.join(format!("start_{server}.sh")), body).unwrap();
}

fn launcher_in(dir: &Path, redirect_output: bool) -> ScriptLauncher {
    ScriptLauncher::from_config(&Config {
        scripts_dir: dir.to_path_buf(),
        redirect_output,
        ..Config::default()
    })
}

#[tokio::test]
async fn test_exit_codes_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "ok", "exit 0\n");
    write_script(dir.path(), "broken", "echo starting\necho oops >&2\nexit 3\n");
    let launcher = launcher_in(dir.path(), true);

    let ok = launcher.resolve("ok").unwrap();
    assert_eq!(launcher.launch(&ok).unwrap().await, 0);

    let broken = launcher.resolve("broken").unwrap();
    assert_eq!(launcher.launch(&broken).unwrap().await, 3);
}

#[tokio::test]
async fn test_script_runs_in_its_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "lobby", "test -f start_lobby.sh || exit 7\nexit 0\n");
    let launcher = launcher_in(dir.path(), false);

    let cmd = launcher.resolve("lobby").unwrap();
    assert_eq!(launcher.launch(&cmd).unwrap().await, 0);
}

#[tokio::test]
async fn test_killed_process_reports_unknown_code() {
    let dir = tempfile::tempdir().unwrap();
    let exit = run(
        "sh",
        &["-c".to_owned(), "kill -9 $$".to_owned()],
        dir.path(),
        OutputMode::Discard,
    )
    .unwrap();
    assert_eq!(exit.await, UNKNOWN_EXIT_CODE);
}

#[tokio::test]
async fn test_unstartable_program_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let res = run(
        "bootvisor-no-such-program",
        &[],
        dir.path(),
        OutputMode::Log {
            label: Arc::from("survival"),
        },
    );
    assert_eq!(res.err().map(|e| e.kind()), Some(std::io::ErrorKind::NotFound));
}

/// Proxy whose only server answers as soon as it is asked.
#[derive(Default)]
struct LocalProxy {
    notices: Mutex<Vec<Notice>>,
}

#[async_trait]
impl Proxy for LocalProxy {
    type Caller = u32;
    type Server = ();

    fn servers(&self) -> Vec<String> {
        vec!["survival".into()]
    }

    fn server(&self, name: &str) -> Option<()> {
        (name == "survival").then_some(())
    }

    async fn ping(&self, _server: &()) -> anyhow::Result<bool> {
        Ok(true)
    }

    async fn connect(&self, _caller: &u32, _server: &()) {}

    async fn notify(&self, _caller: &u32, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

#[tokio::test]
async fn test_orchestrator_runs_real_script() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "survival", "echo booting survival\nexit 0\n");

    let cfg = Config {
        scripts_dir: dir.path().to_path_buf(),
        poll_interval: Duration::from_millis(10),
        global_timeout: Duration::from_secs(5),
        ..Config::default()
    };
    let launcher = Arc::new(ScriptLauncher::from_config(&cfg));
    let proxy = Arc::new(LocalProxy::default());
    let orch = Orchestrator::builder(cfg, Arc::clone(&proxy), launcher).build();
    let mut rx = orch.subscribe_events();

    orch.start_server_with_notify("survival", 1).await.unwrap();

    let ev = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let ev = rx.recv().await.unwrap();
            if ev.kind == EventKind::BootResolved {
                return ev;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(ev.outcome, Some(BootOutcome::Success));
    assert_eq!(
        proxy.notices.lock().last(),
        Some(&Notice::Finished {
            server: "survival".into(),
            outcome: BootOutcome::Success,
        })
    );
}

#[tokio::test]
async fn test_orchestrator_reports_missing_script_path() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config {
        scripts_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    let launcher = Arc::new(ScriptLauncher::from_config(&cfg));
    let orch = Orchestrator::builder(cfg, Arc::new(LocalProxy::default()), launcher).build();

    match orch.start_server("survival").await {
        Err(BootError::ScriptMissing { path, .. }) => {
            assert_eq!(path, dir.path().join("start_survival.sh"));
        }
        other => panic!("expected ScriptMissing, got {other:?}"),
    }
    assert!(!orch.is_booting("survival"));
}
