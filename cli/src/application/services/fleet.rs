//! Application service: launches one worker task per host.
//!
//! Every worker is spawned up front, with no cap on concurrency. Workers only
//! coordinate through the readiness barrier and only write their own status
//! entry.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::application::barrier::ReadinessBarrier;
use crate::application::ports::SessionConnector;
use crate::application::registry::StatusRegistry;
use crate::application::services::collect::collect_host;
use crate::application::services::context::{FleetPlan, HostContext};
use crate::application::services::workflow::run_host;
use crate::domain::Action;

/// Owns the shared state of one run and the tasks working on it.
pub struct Fleet<C: SessionConnector> {
    plan: Arc<FleetPlan>,
    connector: Arc<C>,
    registry: Arc<StatusRegistry>,
    barrier: Arc<ReadinessBarrier>,
    workers: JoinSet<()>,
}

impl<C: SessionConnector> Fleet<C> {
    #[must_use]
    pub fn new(plan: FleetPlan, connector: C) -> Self {
        let registry = Arc::new(StatusRegistry::new(
            plan.topology.roster().iter().map(|h| h.name().to_string()),
        ));
        let poll = Duration::from_millis(plan.config.timing.poll_interval_ms);
        Self {
            plan: Arc::new(plan),
            connector: Arc::new(connector),
            registry,
            barrier: Arc::new(ReadinessBarrier::new(poll)),
            workers: JoinSet::new(),
        }
    }

    /// Registry the monitor and the final summary read from.
    #[must_use]
    pub fn registry(&self) -> Arc<StatusRegistry> {
        Arc::clone(&self.registry)
    }

    #[must_use]
    pub fn barrier(&self) -> Arc<ReadinessBarrier> {
        Arc::clone(&self.barrier)
    }

    /// Spawn one worker per roster host running `action`.
    pub fn launch(&mut self, action: Action) {
        tracing::info!(
            ?action,
            variant = ?self.plan.variant,
            hosts = self.plan.topology.roster().len(),
            "launching workers"
        );
        for ctx in self.contexts() {
            let connector = Arc::clone(&self.connector);
            self.workers.spawn(async move {
                run_host(connector.as_ref(), &ctx, action).await;
            });
        }
    }

    /// Spawn one log-collection worker per roster host.
    ///
    /// Runs alongside whatever workers are still active.
    pub fn collect_logs(&mut self) {
        tracing::info!("collecting logs from every host");
        for ctx in self.contexts() {
            let connector = Arc::clone(&self.connector);
            self.workers.spawn(async move {
                collect_host(connector.as_ref(), &ctx).await;
            });
        }
    }

    /// Wait for every spawned worker to finish.
    pub async fn wait(&mut self) {
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("worker task ended abnormally: {e}");
            }
        }
    }

    /// Whether any worker is still running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.workers.is_empty()
    }

    fn contexts(&self) -> Vec<HostContext> {
        let topology = &self.plan.topology;
        topology
            .roster()
            .iter()
            .map(|host| HostContext {
                host: host.clone(),
                tier: topology.tier_of(host.name(), self.plan.variant),
                plan: Arc::clone(&self.plan),
                barrier: Arc::clone(&self.barrier),
                status: self.registry.handle(host.name()),
            })
            .collect()
    }
}
