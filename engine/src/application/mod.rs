//! Application composition root
//! Wires the supervisor and stats collector against real infrastructure and
//! hands the shared instance to the driving adapters (dependency injection,
//! never ambient global state).

use crate::domain::services::{CoreSupervisor, StatsCollector};
use crate::infrastructure::{default_probe_chain, AgentConfig, ProcSystemReader, TokioCoreRunner};
use std::sync::Arc;
use uuid::Uuid;

pub struct Application {
    config: AgentConfig,
    supervisor: Arc<CoreSupervisor>,
    stats: Arc<StatsCollector>,
    /// Fresh per agent process; reported in base info so the controller can
    /// detect agent restarts.
    session_id: String,
}

impl Application {
    /// Wire the application against real infrastructure.
    pub fn new(config: AgentConfig) -> Self {
        let runner = Arc::new(TokioCoreRunner::new(
            config.core_executable_path.clone(),
            config.core_assets_path.clone(),
        ));
        let probes = default_probe_chain(&config.core_executable_path);
        let supervisor = Arc::new(CoreSupervisor::new(
            runner,
            probes,
            config.core_config_path.clone(),
        ));
        let stats = Arc::new(StatsCollector::new(Arc::new(ProcSystemReader::new())));

        Self::with_components(config, supervisor, stats)
    }

    /// Wire the application with injected components, for tests.
    pub fn with_components(
        config: AgentConfig,
        supervisor: Arc<CoreSupervisor>,
        stats: Arc<StatsCollector>,
    ) -> Self {
        Self {
            config,
            supervisor,
            stats,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn supervisor(&self) -> Arc<CoreSupervisor> {
        self.supervisor.clone()
    }

    pub fn stats(&self) -> Arc<StatsCollector> {
        self.stats.clone()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
