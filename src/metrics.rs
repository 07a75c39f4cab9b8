//! Prometheus self-telemetry for herakles-target-monitor.
//!
//! The service exposes its own refresh and sample behaviour at `/metrics`.
//! Nothing about the monitored targets is re-exported here except the
//! per-status instance counts of the last successful refresh.

use prometheus::{Counter, CounterVec, Gauge, GaugeVec, Opts, Registry};

use herakles_target_monitor::{Application, Refresh, Status};

/// Collection of the service's own Prometheus metrics.
#[derive(Clone)]
pub struct MonitorMetrics {
    // ========== Refresh ==========
    pub refresh_total: Counter,
    pub refresh_failures_total: CounterVec, // labels: kind
    pub refresh_duration_seconds: Gauge,
    pub refresh_in_progress: Gauge,
    pub degraded_probes_total: Counter,
    pub targets: Gauge,
    pub applications: Gauge,
    pub instances: GaugeVec, // labels: status

    // ========== Sample ==========
    pub sample_total: Counter,
    pub sample_failures_total: CounterVec, // labels: kind
    pub sample_duration_seconds: Gauge,
    pub sample_series: Gauge,

    // ========== Event stream ==========
    pub event_streams_total: Counter,
}

impl MonitorMetrics {
    /// Creates and registers all metrics with the registry.
    pub fn new(registry: &Registry) -> Result<Self, Box<dyn std::error::Error>> {
        let refresh_total = Counter::new(
            "herakles_monitor_refresh_total",
            "Total number of status refreshes started",
        )?;
        let refresh_failures_total = CounterVec::new(
            Opts::new(
                "herakles_monitor_refresh_failures_total",
                "Failed status refreshes by error kind",
            ),
            &["kind"],
        )?;
        let refresh_duration_seconds = Gauge::new(
            "herakles_monitor_refresh_duration_seconds",
            "Duration of the last status refresh",
        )?;
        let refresh_in_progress = Gauge::new(
            "herakles_monitor_refresh_in_progress",
            "Number of status refreshes currently running",
        )?;
        let degraded_probes_total = Counter::new(
            "herakles_monitor_degraded_probes_total",
            "Timeline probes that failed and were treated as not found",
        )?;
        let targets = Gauge::new(
            "herakles_monitor_targets",
            "Active targets returned by the last successful refresh",
        )?;
        let applications = Gauge::new(
            "herakles_monitor_applications",
            "Applications returned by the last successful refresh",
        )?;
        let instances = GaugeVec::new(
            Opts::new(
                "herakles_monitor_instances",
                "Instances in the last successful refresh by status",
            ),
            &["status"],
        )?;

        let sample_total = Counter::new(
            "herakles_monitor_sample_total",
            "Total number of combined sample queries",
        )?;
        let sample_failures_total = CounterVec::new(
            Opts::new(
                "herakles_monitor_sample_failures_total",
                "Failed combined sample queries by error kind",
            ),
            &["kind"],
        )?;
        let sample_duration_seconds = Gauge::new(
            "herakles_monitor_sample_duration_seconds",
            "Duration of the last combined sample query",
        )?;
        let sample_series = Gauge::new(
            "herakles_monitor_sample_series",
            "Series in the last combined sample",
        )?;

        let event_streams_total = Counter::new(
            "herakles_monitor_event_streams_total",
            "Server-Sent Event streams opened",
        )?;

        registry.register(Box::new(refresh_total.clone()))?;
        registry.register(Box::new(refresh_failures_total.clone()))?;
        registry.register(Box::new(refresh_duration_seconds.clone()))?;
        registry.register(Box::new(refresh_in_progress.clone()))?;
        registry.register(Box::new(degraded_probes_total.clone()))?;
        registry.register(Box::new(targets.clone()))?;
        registry.register(Box::new(applications.clone()))?;
        registry.register(Box::new(instances.clone()))?;
        registry.register(Box::new(sample_total.clone()))?;
        registry.register(Box::new(sample_failures_total.clone()))?;
        registry.register(Box::new(sample_duration_seconds.clone()))?;
        registry.register(Box::new(sample_series.clone()))?;
        registry.register(Box::new(event_streams_total.clone()))?;

        Ok(Self {
            refresh_total,
            refresh_failures_total,
            refresh_duration_seconds,
            refresh_in_progress,
            degraded_probes_total,
            targets,
            applications,
            instances,
            sample_total,
            sample_failures_total,
            sample_duration_seconds,
            sample_series,
            event_streams_total,
        })
    }

    /// Publishes the outcome of a successful refresh.
    pub fn observe_refresh(&self, refresh: &Refresh, duration_seconds: f64) {
        self.refresh_duration_seconds.set(duration_seconds);
        self.degraded_probes_total
            .inc_by(refresh.degraded_probes as f64);
        self.targets.set(refresh.targets as f64);
        self.applications.set(refresh.applications.len() as f64);

        let (up, down, unknown) = count_by_status(&refresh.applications);
        self.instances
            .with_label_values(&[Status::Up.as_str()])
            .set(up as f64);
        self.instances
            .with_label_values(&[Status::Down.as_str()])
            .set(down as f64);
        self.instances
            .with_label_values(&[Status::Unknown.as_str()])
            .set(unknown as f64);
    }
}

/// Counts instances as (up, down, unknown).
pub fn count_by_status(applications: &[Application]) -> (usize, usize, usize) {
    applications
        .iter()
        .flat_map(|app| app.instances.iter())
        .fold((0, 0, 0), |(up, down, unknown), instance| match instance.status {
            Status::Up => (up + 1, down, unknown),
            Status::Down => (up, down + 1, unknown),
            Status::Unknown => (up, down, unknown + 1),
        })
}
