//! Status timeline resolution.
//!
//! Decides when a target's current state began by looking at the `up` series
//! over a fixed lookback window. Four probes are available:
//!
//! | probe      | expression                                                  |
//! |------------|-------------------------------------------------------------|
//! | first up   | `min_over_time(timestamp(up{..} == 1)[15d:])`               |
//! | last up    | `max_over_time(timestamp(up{..} == 1)[15d:])`               |
//! | first down | `min_over_time(timestamp(up{..} == 0)[15d:])`               |
//! | last down  | `max_over_time(timestamp(up{..} == 0)[15d:])`               |
//!
//! Resolution rules:
//! - healthy: `Up`, started at `last down ?? first up`, duration `last up - started`
//! - unhealthy: `Down`, since `last up ?? first down`
//! - unknown: `Unknown`, no time
//!
//! A failed probe counts as "not found" and never fails the resolution.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::MetricsBackend;
use crate::discovery::{ADDRESS_LABEL, NAME_LABEL};
use crate::error::QueryError;
use crate::model::{epoch_seconds, Health, Instance, QueryValue, Status, Target};
use crate::promql::{escape_label_value, format_window};

/// Default lookback window searched for state-transition evidence.
pub const DEFAULT_LOOKBACK: Duration = Duration::from_secs(15 * 86400);

/// One historical sub-query over the `up` series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    FirstUp,
    LastUp,
    FirstDown,
    LastDown,
}

impl Probe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Probe::FirstUp => "first_up",
            Probe::LastUp => "last_up",
            Probe::FirstDown => "first_down",
            Probe::LastDown => "last_down",
        }
    }

    /// Builds the probe expression for one target.
    pub fn expr(&self, name: &str, address: &str, lookback: Duration) -> String {
        let (aggregation, up) = match self {
            Probe::FirstUp => ("min_over_time", 1),
            Probe::LastUp => ("max_over_time", 1),
            Probe::FirstDown => ("min_over_time", 0),
            Probe::LastDown => ("max_over_time", 0),
        };
        format!(
            r#"{}(timestamp(up{{{}="{}", {}="{}"}} == {})[{}:])"#,
            aggregation,
            NAME_LABEL,
            escape_label_value(name),
            ADDRESS_LABEL,
            escape_label_value(address),
            up,
            format_window(lookback)
        )
    }
}

/// Probes whose results can influence the resolution for `health`.
pub fn probes_for(health: Health) -> &'static [Probe] {
    match health {
        Health::Healthy => &[Probe::LastDown, Probe::FirstUp, Probe::LastUp],
        Health::Unhealthy => &[Probe::LastUp, Probe::FirstDown],
        Health::Unknown => &[],
    }
}

/// Historical evidence gathered for one target. `None` means "not found".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Evidence {
    pub first_up: Option<DateTime<Utc>>,
    pub last_up: Option<DateTime<Utc>>,
    pub first_down: Option<DateTime<Utc>>,
    pub last_down: Option<DateTime<Utc>>,
}

impl Evidence {
    fn set(&mut self, probe: Probe, value: Option<DateTime<Utc>>) {
        match probe {
            Probe::FirstUp => self.first_up = value,
            Probe::LastUp => self.last_up = value,
            Probe::FirstDown => self.first_down = value,
            Probe::LastDown => self.last_down = value,
        }
    }
}

/// Outcome of resolving one target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub status: Status,
    pub time: Option<DateTime<Utc>>,
    pub duration: Duration,
}

/// Applies the fallback chains to gathered evidence.
pub fn resolve(health: Health, evidence: &Evidence) -> Resolution {
    match health {
        Health::Healthy => {
            let started = evidence.last_down.or(evidence.first_up);
            let duration = match (started, evidence.last_up) {
                (Some(start), Some(end)) => {
                    Duration::from_secs((end - start).num_seconds().max(0) as u64)
                }
                _ => Duration::ZERO,
            };
            Resolution {
                status: Status::Up,
                time: started,
                duration,
            }
        }
        Health::Unhealthy => Resolution {
            status: Status::Down,
            time: evidence.last_up.or(evidence.first_down),
            duration: Duration::ZERO,
        },
        Health::Unknown => Resolution {
            status: Status::Unknown,
            time: None,
            duration: Duration::ZERO,
        },
    }
}

/// A target resolved into a displayable instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub app: String,
    pub instance: Instance,
    /// Number of probes that failed and were treated as "not found".
    pub degraded: usize,
}

/// Resolves targets against the backend's `up` history.
#[derive(Clone)]
pub struct TimelineResolver {
    backend: Arc<dyn MetricsBackend>,
    lookback: Duration,
}

impl TimelineResolver {
    pub fn new(backend: Arc<dyn MetricsBackend>, lookback: Duration) -> Self {
        Self { backend, lookback }
    }

    pub fn lookback(&self) -> Duration {
        self.lookback
    }

    /// Runs the probes relevant to the target's health concurrently.
    /// Returns the evidence and the number of failed probes.
    pub async fn gather(&self, target: &Target, at: DateTime<Utc>) -> (Evidence, usize) {
        let probes = probes_for(target.health);
        let results = join_all(
            probes
                .iter()
                .copied()
                .map(|probe| self.probe(probe, target, at)),
        )
        .await;

        let mut evidence = Evidence::default();
        let mut degraded = 0;
        for (probe, result) in probes.iter().zip(results) {
            match result {
                Ok(value) => evidence.set(*probe, value),
                Err(e) => {
                    warn!(
                        "Probe {} failed for {}/{}: {} - treating as not found",
                        probe.as_str(),
                        target.name,
                        target.address,
                        e
                    );
                    degraded += 1;
                }
            }
        }
        (evidence, degraded)
    }

    /// Resolves one target into an `Instance`.
    pub async fn resolve_target(&self, target: &Target, at: DateTime<Utc>) -> ResolvedTarget {
        let (evidence, degraded) = self.gather(target, at).await;
        let resolution = resolve(target.health, &evidence);

        debug!(
            "Resolved {}/{}: {} since {:?} for {}s",
            target.name,
            target.address,
            resolution.status,
            resolution.time,
            resolution.duration.as_secs()
        );

        ResolvedTarget {
            app: target.app.clone(),
            instance: Instance {
                name: target.name.clone(),
                address: target.address.clone(),
                status: resolution.status,
                time: resolution.time,
                duration: resolution.duration,
            },
            degraded,
        }
    }

    async fn probe(
        &self,
        probe: Probe,
        target: &Target,
        at: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, QueryError> {
        let expr = probe.expr(&target.name, &target.address, self.lookback);
        match self.backend.instant_query(&expr, at).await? {
            QueryValue::Vector(points) => Ok(points
                .first()
                .filter(|p| p.value.is_finite())
                .and_then(|p| epoch_seconds(p.value as i64))),
            other => Err(QueryError::MalformedResult(format!(
                "expected vector, got {}",
                other.result_type()
            ))),
        }
    }
}
