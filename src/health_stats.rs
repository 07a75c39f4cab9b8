//! Health statistics and monitoring for the status service.
//!
//! This module provides types and functionality for tracking service health,
//! including refresh performance, backend errors, and HTTP request metrics.

use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            *self = RunningStat {
                count: 1,
                sum: value,
                min: value,
                max: value,
                last: value,
            };
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// Returns (last, avg, max, min, count).
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Thread-safe sliding window of HTTP request timestamps.
pub struct RequestTimestamps {
    inner: Mutex<VecDeque<Instant>>,
}

impl Default for RequestTimestamps {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(1024)),
        }
    }
}

impl RequestTimestamps {
    pub fn record(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            let now = Instant::now();
            guard.push_back(now);
            // Keep only the last 10 minutes
            while guard
                .front()
                .is_some_and(|&t| now.duration_since(t).as_secs() >= 600)
            {
                guard.pop_front();
            }
        }
    }

    pub fn count_last_minute(&self) -> u64 {
        if let Ok(guard) = self.inner.lock() {
            guard
                .iter()
                .filter(|t| t.elapsed().as_secs() < 60)
                .count() as u64
        } else {
            0
        }
    }
}

/// Outcome of the most recent refresh.
#[derive(Clone, Debug, PartialEq)]
pub enum LastRefresh {
    Never,
    Ok(DateTime<Utc>),
    Failed(DateTime<Utc>, String),
}

/// Health statistics for the status service.
pub struct HealthStats {
    // Refresh performance
    pub refresh_duration_seconds: Stat,
    pub targets: Stat,
    pub refresh_success_count: AtomicU64,
    pub refresh_failure_count: AtomicU64,
    pub refresh_timeout_count: AtomicU64,
    pub degraded_probes: AtomicU64,

    // Sample queries
    pub sample_duration_seconds: Stat,
    pub sample_success_count: AtomicU64,
    pub sample_failure_count: AtomicU64,

    // HTTP server stats
    pub http_request_timestamps: RequestTimestamps,
    pub event_streams_opened: AtomicU64,

    // Timing
    pub start_time: Instant,
    pub last_refresh: StdRwLock<LastRefresh>,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            refresh_duration_seconds: Stat::default(),
            targets: Stat::default(),
            refresh_success_count: AtomicU64::new(0),
            refresh_failure_count: AtomicU64::new(0),
            refresh_timeout_count: AtomicU64::new(0),
            degraded_probes: AtomicU64::new(0),
            sample_duration_seconds: Stat::default(),
            sample_success_count: AtomicU64::new(0),
            sample_failure_count: AtomicU64::new(0),
            http_request_timestamps: RequestTimestamps::default(),
            event_streams_opened: AtomicU64::new(0),
            start_time: Instant::now(),
            last_refresh: StdRwLock::new(LastRefresh::Never),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_refresh_success(&self, duration_seconds: f64, targets: usize, degraded: usize) {
        self.refresh_duration_seconds.add_sample(duration_seconds);
        self.targets.add_sample(targets as f64);
        self.refresh_success_count.fetch_add(1, Ordering::Relaxed);
        self.degraded_probes
            .fetch_add(degraded as u64, Ordering::Relaxed);
        self.set_last_refresh(LastRefresh::Ok(Utc::now()));
    }

    pub fn record_refresh_failure(&self, error: &str) {
        self.refresh_failure_count.fetch_add(1, Ordering::Relaxed);
        self.set_last_refresh(LastRefresh::Failed(Utc::now(), error.to_string()));
    }

    pub fn record_refresh_timeout(&self) {
        self.refresh_timeout_count.fetch_add(1, Ordering::Relaxed);
        self.record_refresh_failure("refresh deadline exceeded");
    }

    pub fn record_sample(&self, duration_seconds: f64, success: bool) {
        self.sample_duration_seconds.add_sample(duration_seconds);
        if success {
            self.sample_success_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.sample_failure_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_http_request(&self) {
        self.http_request_timestamps.record();
    }

    pub fn record_event_stream(&self) {
        self.event_streams_opened.fetch_add(1, Ordering::Relaxed);
    }

    fn set_last_refresh(&self, value: LastRefresh) {
        if let Ok(mut guard) = self.last_refresh.write() {
            *guard = value;
        }
    }

    pub fn last_refresh(&self) -> LastRefresh {
        self.last_refresh
            .read()
            .map(|g| g.clone())
            .unwrap_or(LastRefresh::Never)
    }

    /// True unless the most recent refresh failed.
    pub fn is_healthy(&self) -> bool {
        !matches!(self.last_refresh(), LastRefresh::Failed(..))
    }

    pub fn get_refresh_success_rate(&self) -> f64 {
        let success = self.refresh_success_count.load(Ordering::Relaxed);
        let failure = self.refresh_failure_count.load(Ordering::Relaxed);
        let total = success + failure;
        if total == 0 {
            100.0
        } else {
            (success as f64 / total as f64) * 100.0
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn render_table(&self) -> String {
        let left_col = 26usize;
        let col_w = 12usize;
        let mut out = String::new();

        let row = |out: &mut String, label: &str, cells: [String; 4]| {
            writeln!(
                out,
                "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
                label,
                cells[0],
                cells[1],
                cells[2],
                cells[3],
                left = left_col,
                col = col_w
            )
            .ok();
        };

        let stat_cells = |stat: &Stat, precision: usize| {
            let (cur, avg, max, min, _) = stat.snapshot();
            [
                format!("{:.p$}", cur, p = precision),
                format!("{:.p$}", avg, p = precision),
                format!("{:.p$}", max, p = precision),
                format!("{:.p$}", min, p = precision),
            ]
        };

        let flat = |value: String| [value.clone(), value.clone(), value.clone(), value];

        writeln!(out, "HEALTH ENDPOINT - STATUS SERVICE INTERNAL STATS").ok();
        writeln!(out, "===============================================").ok();
        writeln!(out).ok();
        row(
            &mut out,
            "",
            [
                "current".into(),
                "average".into(),
                "max".into(),
                "min".into(),
            ],
        );

        writeln!(out).ok();
        writeln!(out, "REFRESH PERFORMANCE").ok();
        writeln!(out, "-------------------").ok();
        row(&mut out, "refresh_duration (s)", stat_cells(&self.refresh_duration_seconds, 3));
        row(&mut out, "targets", stat_cells(&self.targets, 0));
        row(
            &mut out,
            "refresh_success_rate (%)",
            flat(format!("{:.1}", self.get_refresh_success_rate())),
        );

        writeln!(out).ok();
        writeln!(out, "SAMPLE QUERIES").ok();
        writeln!(out, "--------------").ok();
        row(&mut out, "sample_duration (s)", stat_cells(&self.sample_duration_seconds, 3));

        writeln!(out).ok();
        writeln!(out, "COUNTERS").ok();
        writeln!(out, "--------").ok();
        let counters = [
            ("refresh_success", &self.refresh_success_count),
            ("refresh_failure", &self.refresh_failure_count),
            ("refresh_timeout", &self.refresh_timeout_count),
            ("degraded_probes", &self.degraded_probes),
            ("sample_success", &self.sample_success_count),
            ("sample_failure", &self.sample_failure_count),
            ("event_streams_opened", &self.event_streams_opened),
        ];
        for (name, counter) in counters {
            writeln!(
                out,
                "{:left$} | {}",
                name,
                counter.load(Ordering::Relaxed),
                left = left_col
            )
            .ok();
        }
        writeln!(
            out,
            "{:left$} | {}",
            "http_requests_last_minute",
            self.http_request_timestamps.count_last_minute(),
            left = left_col
        )
        .ok();

        writeln!(out).ok();
        let last = match self.last_refresh() {
            LastRefresh::Never => "never".to_string(),
            LastRefresh::Ok(at) => format!("ok at {}", at.format("%H:%M:%S")),
            LastRefresh::Failed(at, err) => format!("failed at {}: {}", at.format("%H:%M:%S"), err),
        };
        writeln!(out, "Last refresh: {}", last).ok();

        out
    }
}
