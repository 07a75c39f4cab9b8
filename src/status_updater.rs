//! Refresh and sample logic shared by `/apps`, `/sample`, `/event` and the
//! one-shot CLI commands.
//!
//! Every refresh runs under the configured deadline. Dropping the engine
//! future on expiry cancels the backend requests still in flight.

use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use herakles_target_monitor::{QueryError, Refresh, Sample};

use crate::state::SharedState;

/// Failure of a refresh or sample issued by the service.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("refresh deadline of {}s exceeded", .0.as_secs())]
    DeadlineExceeded(Duration),
}

impl UpdateError {
    /// Short machine-readable kind used as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateError::Query(e) => e.kind(),
            UpdateError::DeadlineExceeded(_) => "deadline",
        }
    }
}

/// Runs one full refresh and records its outcome.
#[instrument(skip(state))]
pub async fn refresh_status(state: &SharedState) -> Result<Refresh, UpdateError> {
    let deadline = state.config.refresh_timeout();
    let start = Instant::now();

    state.metrics.refresh_total.inc();
    state.metrics.refresh_in_progress.inc();
    let outcome = tokio::time::timeout(deadline, state.engine.refresh()).await;
    state.metrics.refresh_in_progress.dec();

    let elapsed = start.elapsed().as_secs_f64();
    let result = match outcome {
        Ok(Ok(refresh)) => Ok(refresh),
        Ok(Err(e)) => Err(UpdateError::Query(e)),
        Err(_) => Err(UpdateError::DeadlineExceeded(deadline)),
    };

    match &result {
        Ok(refresh) => {
            state.metrics.observe_refresh(refresh, elapsed);
            state.health_stats.record_refresh_success(
                elapsed,
                refresh.targets,
                refresh.degraded_probes,
            );
            if refresh.degraded_probes > 0 {
                warn!(
                    "Refresh completed with {} degraded probes",
                    refresh.degraded_probes
                );
            }
            debug!(
                "Refresh of {} targets into {} applications took {:.3}s",
                refresh.targets,
                refresh.applications.len(),
                elapsed
            );
        }
        Err(e) => {
            state
                .metrics
                .refresh_failures_total
                .with_label_values(&[e.kind()])
                .inc();
            match e {
                UpdateError::DeadlineExceeded(_) => state.health_stats.record_refresh_timeout(),
                UpdateError::Query(q) => state.health_stats.record_refresh_failure(&q.to_string()),
            }
            info!("Refresh failed after {:.3}s: {}", elapsed, e);
        }
    }

    result
}

/// Runs the combined sample query and records its outcome.
#[instrument(skip(state))]
pub async fn take_sample(state: &SharedState) -> Result<Option<Sample>, UpdateError> {
    let start = Instant::now();
    state.metrics.sample_total.inc();

    let result = state.engine.sample().await;
    let elapsed = start.elapsed().as_secs_f64();

    state.metrics.sample_duration_seconds.set(elapsed);
    state.health_stats.record_sample(elapsed, result.is_ok());

    match &result {
        Ok(sample) => {
            let series = sample.as_ref().map(|s| s.value.len()).unwrap_or(0);
            state.metrics.sample_series.set(series as f64);
        }
        Err(e) => {
            state
                .metrics
                .sample_failures_total
                .with_label_values(&[e.kind()])
                .inc();
            info!("Sample query failed after {:.3}s: {}", elapsed, e);
        }
    }

    result.map_err(UpdateError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_error_kinds() {
        assert_eq!(UpdateError::Query(QueryError::Timeout).kind(), "timeout");
        let e = UpdateError::DeadlineExceeded(Duration::from_secs(30));
        assert_eq!(e.kind(), "deadline");
        assert_eq!(e.to_string(), "refresh deadline of 30s exceeded");
    }
}
