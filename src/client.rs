//! Metrics backend client.
//!
//! `MetricsBackend` is the seam between the engine and the time-series
//! backend. `PrometheusClient` implements it against the Prometheus HTTP API:
//!
//! - `GET /api/v1/query?query=<expr>&time=<secs>` for instant queries
//! - `GET /api/v1/targets?state=active` for target discovery
//!
//! Every request is bounded by the client's per-call timeout. The client holds
//! no mutable state and is safe to share between concurrent refreshes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::QueryError;
use crate::model::{Point, QueryValue};

/// Default per-call timeout for backend requests.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Raw active target as returned by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActiveTarget {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub health: String,
}

/// Source of instant queries and active targets.
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// Evaluates `expr` at `at`.
    async fn instant_query(&self, expr: &str, at: DateTime<Utc>)
        -> Result<QueryValue, QueryError>;

    /// Lists the currently active scrape targets.
    async fn targets(&self) -> Result<Vec<ActiveTarget>, QueryError>;
}

/// Prometheus HTTP API client.
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    client: Client,
    endpoint: String,
}

impl PrometheusClient {
    /// Creates a client for `endpoint` (e.g. `http://localhost:9090`).
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, QueryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QueryError::BackendUnreachable(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client from host, port and scheme.
    pub fn from_host(
        scheme: &str,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self, QueryError> {
        Self::new(format!("{}://{}:{}", scheme, host, port), timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, QueryError> {
        let url = format!("{}{}", self.endpoint, path);

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();

        // Prometheus reports query errors with a JSON body on 4xx/5xx too.
        let body: ApiResponse<T> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                QueryError::Timeout
            } else {
                QueryError::MalformedResult(format!(
                    "unexpected response from {} (HTTP {}): {}",
                    path, status, e
                ))
            }
        })?;

        body.into_data()
    }
}

#[async_trait]
impl MetricsBackend for PrometheusClient {
    #[instrument(skip(self), level = "debug")]
    async fn instant_query(
        &self,
        expr: &str,
        at: DateTime<Utc>,
    ) -> Result<QueryValue, QueryError> {
        let time = format!("{:.3}", at.timestamp_millis() as f64 / 1000.0);
        let data: QueryData = self
            .get("/api/v1/query", &[("query", expr.to_string()), ("time", time)])
            .await?;
        let value = data.into_value()?;
        debug!("Query returned {} result", value.result_type());
        Ok(value)
    }

    #[instrument(skip(self), level = "debug")]
    async fn targets(&self) -> Result<Vec<ActiveTarget>, QueryError> {
        let data: TargetsData = self
            .get("/api/v1/targets", &[("state", "active".to_string())])
            .await?;
        debug!("Backend reported {} active targets", data.active_targets.len());
        Ok(data.active_targets)
    }
}

/// Prometheus API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: String,
    data: Option<T>,
    #[serde(rename = "errorType")]
    error_type: Option<String>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_data(self) -> Result<T, QueryError> {
        if self.status != "success" {
            return Err(QueryError::MalformedResult(format!(
                "{}: {}",
                self.error_type.as_deref().unwrap_or("error"),
                self.error.as_deref().unwrap_or("no error message")
            )));
        }
        self.data
            .ok_or_else(|| QueryError::MalformedResult("response has no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct TargetsData {
    #[serde(rename = "activeTargets", default)]
    active_targets: Vec<ActiveTarget>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(rename = "resultType")]
    result_type: String,
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawVectorPoint {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    value: (f64, String),
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    #[serde(default)]
    values: Vec<(f64, String)>,
}

impl QueryData {
    fn into_value(self) -> Result<QueryValue, QueryError> {
        let malformed = |e: serde_json::Error| QueryError::MalformedResult(e.to_string());

        match self.result_type.as_str() {
            "vector" => {
                let raw: Vec<RawVectorPoint> =
                    serde_json::from_value(self.result).map_err(malformed)?;
                let points = raw
                    .into_iter()
                    .map(|p| {
                        Ok(Point {
                            labels: p.metric,
                            value: parse_sample_value(&p.value.1)?,
                            timestamp: p.value.0,
                        })
                    })
                    .collect::<Result<Vec<_>, QueryError>>()?;
                Ok(QueryValue::Vector(points))
            }
            "scalar" => {
                let (timestamp, value): (f64, String) =
                    serde_json::from_value(self.result).map_err(malformed)?;
                Ok(QueryValue::Scalar {
                    timestamp,
                    value: parse_sample_value(&value)?,
                })
            }
            "string" => {
                let (timestamp, value): (f64, String) =
                    serde_json::from_value(self.result).map_err(malformed)?;
                Ok(QueryValue::String { timestamp, value })
            }
            "matrix" => {
                let series: Vec<RawSeries> =
                    serde_json::from_value(self.result).map_err(malformed)?;
                Ok(QueryValue::Matrix(series.iter().map(|s| s.values.len()).sum()))
            }
            other => Err(QueryError::MalformedResult(format!(
                "unknown result type '{}'",
                other
            ))),
        }
    }
}

/// Parses a Prometheus sample value string (`"1"`, `"NaN"`, `"+Inf"`, ...).
fn parse_sample_value(raw: &str) -> Result<f64, QueryError> {
    raw.parse::<f64>()
        .map_err(|_| QueryError::MalformedResult(format!("invalid sample value '{}'", raw)))
}
