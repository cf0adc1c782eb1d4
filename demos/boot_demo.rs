//! # Example: on-demand boot behind a toy proxy
//!
//! Writes a startup script into a temp directory, then lets two players ask
//! for the same offline server: one joins (and gets connected), one only wants
//! to know when it is up. The "server" starts answering pings a few polls after
//! its script exits.
//!
//! ```text
//! RUST_LOG=info,bootvisor=debug cargo run --example boot_demo
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bootvisor::{Config, Notice, Orchestrator, Proxy, ScriptLauncher, Subscribe};
use tracing_subscriber::EnvFilter;

/// One backend ("survival") that comes up after three pings.
#[derive(Default)]
struct ToyProxy {
    pings: AtomicU32,
}

#[async_trait]
impl Proxy for ToyProxy {
    type Caller = &'static str;
    type Server = &'static str;

    fn servers(&self) -> Vec<String> {
        vec!["survival".into()]
    }

    fn server(&self, name: &str) -> Option<&'static str> {
        (name == "survival").then_some("survival")
    }

    async fn ping(&self, _server: &&'static str) -> anyhow::Result<bool> {
        Ok(self.pings.fetch_add(1, Ordering::SeqCst) >= 3)
    }

    async fn connect(&self, caller: &&'static str, server: &&'static str) {
        println!("[proxy] {caller} -> {server}");
    }

    async fn notify(&self, caller: &&'static str, notice: Notice) {
        println!("[{caller}] {notice}  ({})", notice.key());
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let scripts = tempfile::tempdir()?;
    std::fs::write(
        scripts.path().join("start_survival.sh"),
        "echo \"booting survival from $(pwd)\"\nsleep 1\necho done\n",
    )?;

    let cfg = Config::from_toml_str(&format!(
        r#"
        [server_startup]
        global_timeout = 10
        polling_delay = 1

        [scripts]
        dir = "{}"
        "#,
        scripts.path().display()
    ))?;

    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(bootvisor::LogWriter::new())];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn Subscribe>> = Vec::new();

    let launcher = Arc::new(ScriptLauncher::from_config(&cfg));
    let orch = Orchestrator::builder(cfg, Arc::new(ToyProxy::default()), launcher)
        .with_subscribers(subs)
        .build();
    let mut events = orch.subscribe_events();

    println!("join   -> {:?}", orch.join("alex", "survival").await?);
    println!("start  -> {:?}", orch.start("steve", "survival").await?);
    println!("info   -> {:?}", orch.info("survival").await?);

    while let Ok(ev) = events.recv().await {
        if ev.is_terminal() {
            println!("done   -> {:?}", ev.outcome);
            break;
        }
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    orch.shutdown();
    Ok(())
}
