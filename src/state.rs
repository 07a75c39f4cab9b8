//! Application state shared by the HTTP handlers.

use prometheus::Registry;
use std::sync::Arc;

use herakles_target_monitor::StatusEngine;

use crate::config::Config;
use crate::health_stats::HealthStats;
use crate::metrics::MonitorMetrics;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests and event streams.
pub struct AppState {
    pub engine: StatusEngine,
    pub registry: Registry,
    pub metrics: MonitorMetrics,
    pub config: Arc<Config>,
    pub health_stats: Arc<HealthStats>,
}

impl AppState {
    /// Builds the state with a fresh registry and telemetry.
    pub fn new(engine: StatusEngine, config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();
        let metrics = MonitorMetrics::new(&registry)?;
        Ok(Self {
            engine,
            registry,
            metrics,
            config: Arc::new(config),
            health_stats: Arc::new(HealthStats::new()),
        })
    }

    /// Seconds since the service started, as shown on `/` and `/health`.
    pub fn uptime_seconds(&self) -> u64 {
        self.health_stats.get_uptime_seconds()
    }
}
