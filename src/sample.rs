//! Combined-query snapshots.
//!
//! Each configured metric expression is relabeled with `name="<metric>"` and
//! all of them are joined with `or`, so one instant query returns a
//! self-describing vector. The vector is reduced to a `Sample` keyed by
//! `"<instance>,<name>"`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::client::MetricsBackend;
use crate::discovery::ADDRESS_LABEL;
use crate::error::QueryError;
use crate::model::{Point, QueryValue, Sample};
use crate::promql::{join_or, relabel};

/// Label added to every sub-expression result.
pub const METRIC_NAME_LABEL: &str = "name";

/// One sub-expression of the combined query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMetric {
    /// Metric name written into the `name` label, e.g. `mem_used_bytes`.
    pub name: String,
    /// PromQL expression producing one series per instance.
    pub expr: String,
}

impl SampleMetric {
    pub fn new(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expr: expr.into(),
        }
    }
}

/// Memory and CPU metrics shown next to each instance by default.
pub fn default_metrics() -> Vec<SampleMetric> {
    vec![
        SampleMetric::new(
            "mem_used_bytes",
            r#"sum by (job, instance) (go_memstats_sys_bytes{job="prom"})"#,
        ),
        SampleMetric::new(
            "cpu_usage",
            r#"100 - (avg by (job, instance) (rate(windows_cpu_time_total{job="windows", mode="idle"}[10s])) * 100)"#,
        ),
        SampleMetric::new(
            "mem_used_bytes",
            r#"windows_memory_physical_total_bytes{job="windows"} - windows_memory_physical_free_bytes{job="windows"}"#,
        ),
        SampleMetric::new(
            "mem_used_percent",
            r#"((windows_memory_physical_total_bytes{job="windows"} - windows_memory_physical_free_bytes{job="windows"}) / windows_memory_physical_total_bytes{job="windows"}) * 100"#,
        ),
        SampleMetric::new(
            "mem_used_bytes",
            r#"sum by (job, instance) (go_memstats_sys_bytes{job="go"})"#,
        ),
        SampleMetric::new(
            "mem_used_bytes",
            r#"sum by (job, instance) (jvm_memory_used_bytes{job="java"})"#,
        ),
        SampleMetric::new(
            "mem_used_bytes",
            r#"sum by (job, instance) (process_resident_memory_bytes{job="mysql"})"#,
        ),
        SampleMetric::new(
            "mem_used_bytes",
            r#"sum by (job, instance) (redis_memory_used_bytes{job="redis"})"#,
        ),
    ]
}

/// Builds the combined expression for `metrics`.
pub fn combined_expr(metrics: &[SampleMetric]) -> String {
    join_or(metrics.iter().map(|m| relabel(&m.expr, &m.name)))
}

/// Reduces result points into a snapshot. Returns `None` for an empty vector.
pub fn reduce(points: &[Point]) -> Option<Sample> {
    let first = points.first()?;
    let mut value = BTreeMap::new();
    for point in points {
        let key = format!(
            "{},{}",
            point.label(ADDRESS_LABEL),
            point.label(METRIC_NAME_LABEL)
        );
        value.insert(key, point.value);
    }
    Some(Sample {
        timestamp: first.timestamp as i64,
        value,
    })
}

/// Runs the combined query and reduces it into a `Sample`.
#[derive(Clone)]
pub struct SampleAggregator {
    backend: Arc<dyn MetricsBackend>,
    metrics: Vec<SampleMetric>,
}

impl SampleAggregator {
    pub fn new(backend: Arc<dyn MetricsBackend>, metrics: Vec<SampleMetric>) -> Self {
        Self { backend, metrics }
    }

    pub fn metrics(&self) -> &[SampleMetric] {
        &self.metrics
    }

    /// Executes exactly one instant query. An empty result is `Ok(None)`.
    #[instrument(skip(self))]
    pub async fn snapshot(&self, at: DateTime<Utc>) -> Result<Option<Sample>, QueryError> {
        if self.metrics.is_empty() {
            debug!("No sample metrics configured");
            return Ok(None);
        }

        let expr = combined_expr(&self.metrics);
        debug!("Sample expression: {}", expr);

        match self.backend.instant_query(&expr, at).await? {
            QueryValue::Vector(points) => {
                let sample = reduce(&points);
                debug!("Sample reduced {} points", points.len());
                Ok(sample)
            }
            other => Err(QueryError::MalformedResult(format!(
                "cannot convert {} result to vector",
                other.result_type()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(instance: &str, name: &str, value: f64, timestamp: f64) -> Point {
        let mut labels = BTreeMap::new();
        labels.insert("instance".to_string(), instance.to_string());
        labels.insert("name".to_string(), name.to_string());
        Point {
            labels,
            value,
            timestamp,
        }
    }

    #[test]
    fn test_reduce_empty_is_none() {
        assert!(reduce(&[]).is_none());
    }

    #[test]
    fn test_reduce_keys_by_address_and_name() {
        let sample = reduce(&[
            point("10.0.0.1:9182", "cpu_usage", 12.5, 1700000000.25),
            point("10.0.0.1:9182", "mem_used_bytes", 2048.0, 1700000000.25),
        ])
        .unwrap();
        assert_eq!(sample.timestamp, 1700000000);
        assert_eq!(sample.value.len(), 2);
        assert_eq!(sample.value["10.0.0.1:9182,cpu_usage"], 12.5);
        assert_eq!(sample.value["10.0.0.1:9182,mem_used_bytes"], 2048.0);
    }

    #[test]
    fn test_combined_expr_relabels_each_metric() {
        let expr = combined_expr(&[
            SampleMetric::new("a", "x"),
            SampleMetric::new("b", "y"),
        ]);
        assert_eq!(
            expr,
            r#"label_replace(x, "name", "a", "", "") or label_replace(y, "name", "b", "", "")"#
        );
    }

    #[test]
    fn test_default_metrics_are_named() {
        let metrics = default_metrics();
        assert_eq!(metrics.len(), 8);
        assert!(metrics.iter().all(|m| !m.name.is_empty() && !m.expr.is_empty()));
    }
}
