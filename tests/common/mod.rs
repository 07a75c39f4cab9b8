//! In-memory `MetricsBackend` used by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herakles_target_monitor::{ActiveTarget, MetricsBackend, Point, QueryError, QueryValue};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

/// Canned answer for one expression.
#[derive(Clone)]
pub enum Answer {
    /// One-point vector whose value is an epoch timestamp.
    Timestamp(i64),
    /// Arbitrary vector.
    Points(Vec<Point>),
    /// Scalar result, which callers expecting a vector must reject.
    Scalar(f64),
    /// Backend times out.
    Timeout,
    /// Backend cannot be reached.
    Unreachable,
}

/// Test double answering queries from a table of exact expressions.
/// Unlisted expressions return an empty vector.
#[derive(Default)]
pub struct MockBackend {
    targets: Option<Vec<ActiveTarget>>,
    answers: BTreeMap<String, Answer>,
    default_answer: Option<Answer>,
    delay: Option<Duration>,
    queries: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            targets: Some(Vec::new()),
            ..Default::default()
        }
    }

    /// Discovery fails with `BackendUnreachable`.
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, app: &str, job: &str, instance: &str, health: &str) -> Self {
        let labels = BTreeMap::from([
            ("app".to_string(), app.to_string()),
            ("job".to_string(), job.to_string()),
            ("instance".to_string(), instance.to_string()),
        ]);
        self.targets.get_or_insert_with(Vec::new).push(ActiveTarget {
            labels,
            health: health.to_string(),
        });
        self
    }

    pub fn with_raw_target(mut self, target: ActiveTarget) -> Self {
        self.targets.get_or_insert_with(Vec::new).push(target);
        self
    }

    pub fn answer(mut self, expr: impl Into<String>, answer: Answer) -> Self {
        self.answers.insert(expr.into(), answer);
        self
    }

    pub fn answer_everything(mut self, answer: Answer) -> Self {
        self.default_answer = Some(answer);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Expressions received so far, in arrival order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

/// Builds a vector point with the given labels.
pub fn point(labels: &[(&str, &str)], value: f64, timestamp: f64) -> Point {
    Point {
        labels: labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        value,
        timestamp,
    }
}

#[async_trait]
impl MetricsBackend for MockBackend {
    async fn instant_query(
        &self,
        expr: &str,
        at: DateTime<Utc>,
    ) -> Result<QueryValue, QueryError> {
        self.queries.lock().unwrap().push(expr.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let answer = self
            .answers
            .get(expr)
            .or(self.default_answer.as_ref())
            .cloned();

        match answer {
            None => Ok(QueryValue::Vector(vec![])),
            Some(Answer::Timestamp(secs)) => Ok(QueryValue::Vector(vec![point(
                &[],
                secs as f64,
                at.timestamp() as f64,
            )])),
            Some(Answer::Points(points)) => Ok(QueryValue::Vector(points)),
            Some(Answer::Scalar(value)) => Ok(QueryValue::Scalar {
                timestamp: at.timestamp() as f64,
                value,
            }),
            Some(Answer::Timeout) => Err(QueryError::Timeout),
            Some(Answer::Unreachable) => {
                Err(QueryError::BackendUnreachable("connection refused".into()))
            }
        }
    }

    async fn targets(&self) -> Result<Vec<ActiveTarget>, QueryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.targets
            .clone()
            .ok_or_else(|| QueryError::BackendUnreachable("connection refused".into()))
    }
}
