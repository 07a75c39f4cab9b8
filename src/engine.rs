//! Status engine facade.
//!
//! `StatusEngine` wires discovery, timeline resolution, grouping and sample
//! aggregation around one shared backend handle. It keeps no state between
//! calls; the caller owns polling and per-refresh deadlines. Dropping a
//! refresh future cancels every in-flight backend request.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::client::MetricsBackend;
use crate::discovery::list_targets;
use crate::error::QueryError;
use crate::grouping::group_applications;
use crate::model::{Application, QueryValue, Sample};
use crate::sample::{default_metrics, SampleAggregator, SampleMetric};
use crate::timeline::{ResolvedTarget, TimelineResolver, DEFAULT_LOOKBACK};

/// Default number of targets resolved concurrently.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Expression used to verify backend connectivity.
pub const VERIFY_EXPR: &str = "up";

/// Tunables for a `StatusEngine`.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Window searched for state-transition evidence.
    pub lookback: Duration,
    /// Upper bound on targets resolved at the same time.
    pub max_concurrency: usize,
    /// Sub-expressions of the combined sample query.
    pub sample_metrics: Vec<SampleMetric>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            lookback: DEFAULT_LOOKBACK,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            sample_metrics: default_metrics(),
        }
    }
}

/// Result of one refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Refresh {
    pub applications: Vec<Application>,
    /// Number of targets returned by discovery.
    pub targets: usize,
    /// Number of timeline probes that failed and were treated as "not found".
    pub degraded_probes: usize,
}

/// Entry point used by the HTTP layer and the CLI.
#[derive(Clone)]
pub struct StatusEngine {
    backend: Arc<dyn MetricsBackend>,
    resolver: TimelineResolver,
    aggregator: SampleAggregator,
    max_concurrency: usize,
}

impl StatusEngine {
    pub fn new(backend: Arc<dyn MetricsBackend>, options: EngineOptions) -> Self {
        Self {
            resolver: TimelineResolver::new(backend.clone(), options.lookback),
            aggregator: SampleAggregator::new(backend.clone(), options.sample_metrics),
            max_concurrency: options.max_concurrency.max(1),
            backend,
        }
    }

    pub fn resolver(&self) -> &TimelineResolver {
        &self.resolver
    }

    pub fn aggregator(&self) -> &SampleAggregator {
        &self.aggregator
    }

    /// Checks that the backend answers an instant query.
    #[instrument(skip(self))]
    pub async fn verify(&self) -> Result<(), QueryError> {
        match self.backend.instant_query(VERIFY_EXPR, Utc::now()).await? {
            QueryValue::Vector(points) => {
                info!("Backend reachable, {} series for '{}'", points.len(), VERIFY_EXPR);
                Ok(())
            }
            other => Err(QueryError::MalformedResult(format!(
                "expected vector for '{}', got {}",
                VERIFY_EXPR,
                other.result_type()
            ))),
        }
    }

    /// Discovers targets, resolves each one and groups the result.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Refresh, QueryError> {
        let targets = list_targets(self.backend.as_ref()).await?;
        let target_count = targets.len();
        let at = Utc::now();

        // `buffered` keeps discovery order, which grouping relies on.
        let resolved: Vec<ResolvedTarget> = stream::iter(targets)
            .map(|target| {
                let resolver = self.resolver.clone();
                async move { resolver.resolve_target(&target, at).await }
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let degraded_probes = resolved.iter().map(|r| r.degraded).sum();
        let applications =
            group_applications(resolved.into_iter().map(|r| (r.app, r.instance)));

        Ok(Refresh {
            applications,
            targets: target_count,
            degraded_probes,
        })
    }

    /// Convenience wrapper over `refresh` returning only the applications.
    pub async fn applications(&self) -> Result<Vec<Application>, QueryError> {
        Ok(self.refresh().await?.applications)
    }

    /// Runs the combined sample query at the current time.
    pub async fn sample(&self) -> Result<Option<Sample>, QueryError> {
        self.aggregator.snapshot(Utc::now()).await
    }
}
