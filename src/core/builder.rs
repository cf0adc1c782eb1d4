use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    events::Bus,
    proxy::Proxy,
    subscribers::{Subscribe, SubscriberSet},
};

use super::{launcher::Launcher, orchestrator::Orchestrator};

/// Builder for constructing an [`Orchestrator`] with optional observers.
pub struct OrchestratorBuilder<P: Proxy> {
    cfg: Config,
    proxy: Arc<P>,
    launcher: Arc<dyn Launcher>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<P: Proxy> OrchestratorBuilder<P> {
    /// Creates a new builder with the given configuration and collaborators.
    pub fn new<L: Launcher>(cfg: Config, proxy: Arc<P>, launcher: Arc<L>) -> Self {
        Self {
            cfg,
            proxy,
            launcher,
            subscribers: Vec::new(),
        }
    }

    /// Sets event observers.
    ///
    /// Observers receive lifecycle events (attempt started, script exited,
    /// resolved, ...) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the orchestrator.
    ///
    /// Must be called inside a tokio runtime: this spawns the observer workers
    /// and the listener that feeds them from the event bus.
    pub fn build(self) -> Arc<Orchestrator<P>> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers));
        let runtime_token = CancellationToken::new();

        let orch = Arc::new(Orchestrator::new_internal(
            self.cfg,
            self.proxy,
            self.launcher,
            bus,
            subs,
            runtime_token,
        ));
        orch.subscriber_listener();
        orch
    }
}
