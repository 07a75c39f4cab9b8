//! Data model shared by the engine components.
//!
//! Everything here is created fresh per refresh and serialized by the caller.
//! Wire formats:
//! - `Status` serializes to `"UP"`, `"DOWN"` or `"UNKNOWN"`.
//! - `Instance.time` serializes as `"YYYY-MM-DD HH:MM:SS"` (UTC), or `""` when absent.
//! - `Instance.duration` serializes as human text such as `"1d 2h 3m 4s"`.
//! - `Sample` serializes as `{"timestamp": <secs>, "value": {"<addr>,<name>": <f64>}}`.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Display format for state timestamps.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_DAY: u64 = 86400;

/// Live health classification reported by the backend for a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Unhealthy,
    Unknown,
}

impl Health {
    /// Parses the backend's health string (`"up"`, `"down"`, anything else).
    pub fn from_backend(value: &str) -> Self {
        match value {
            "up" => Health::Healthy,
            "down" => Health::Unhealthy,
            _ => Health::Unknown,
        }
    }
}

/// Displayed instance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Up,
    Down,
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Up => "UP",
            Status::Down => "DOWN",
            Status::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// An active scrape target as reported by discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Application name (`app` label).
    pub app: String,
    /// Instance name (`job` label).
    pub name: String,
    /// Instance address (`instance` label).
    pub address: String,
    pub health: Health,
}

/// One labeled point of an instant-query result.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub labels: BTreeMap<String, String>,
    pub value: f64,
    /// Evaluation timestamp in (fractional) epoch seconds.
    pub timestamp: f64,
}

impl Point {
    /// Returns the label value, or an empty string when the label is missing.
    pub fn label(&self, name: &str) -> &str {
        self.labels.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Typed result of an instant query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Vector(Vec<Point>),
    Scalar { timestamp: f64, value: f64 },
    String { timestamp: f64, value: String },
    Matrix(usize),
}

impl QueryValue {
    pub fn result_type(&self) -> &'static str {
        match self {
            QueryValue::Vector(_) => "vector",
            QueryValue::Scalar { .. } => "scalar",
            QueryValue::String { .. } => "string",
            QueryValue::Matrix(_) => "matrix",
        }
    }
}

/// One resolved instance of an application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instance {
    pub name: String,
    #[serde(rename = "addr")]
    pub address: String,
    pub status: Status,
    /// Up: state started at. Down: down since. `None` when no evidence was found.
    #[serde(serialize_with = "serialize_time")]
    pub time: Option<DateTime<Utc>>,
    /// Time spent in the Up state; zero otherwise.
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
}

/// Instances sharing one application name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Application {
    pub name: String,
    pub instances: Vec<Instance>,
}

/// Point-in-time snapshot keyed by `"<address>,<metric name>"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: i64,
    pub value: BTreeMap<String, f64>,
}

/// Converts epoch seconds into a UTC timestamp.
pub fn epoch_seconds(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// Formats a duration as `"1d 2h 3m 4s"`, omitting leading zero units.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / SECONDS_PER_DAY;
    let hours = (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = total % SECONDS_PER_MINUTE;

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

fn serialize_time<S: Serializer>(
    time: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match time {
        Some(t) => serializer.collect_str(&t.format(TIME_FORMAT)),
        None => serializer.serialize_str(""),
    }
}

fn serialize_duration<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*duration))
}
