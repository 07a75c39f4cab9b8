//! Herakles Target Monitor Library
//!
//! This library turns Prometheus scrape targets into a per-application status
//! board: which instances are up or down right now, and since when. It is
//! framework-agnostic, so the HTTP layer (or any other caller) only has to
//! serialize what the engine returns.
//!
//! # Features
//!
//! - **Target Discovery**: Active targets with `app`/`job`/`instance` identity and live health
//! - **Timeline Resolution**: "Up since" / "down since" from 15 days of `up` history
//! - **Deterministic Grouping**: Fixed application priority, instances ordered by address
//! - **Combined Snapshots**: One `or`-joined query for memory/CPU values per instance
//!
//! # Usage
//!
//! ```rust,no_run
//! use herakles_target_monitor::{EngineOptions, PrometheusClient, StatusEngine};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PrometheusClient::new("http://localhost:9090", Duration::from_secs(5))?;
//! let engine = StatusEngine::new(Arc::new(client), EngineOptions::default());
//!
//! engine.verify().await?;
//!
//! for app in engine.applications().await? {
//!     for instance in &app.instances {
//!         println!("{} {} {}", app.name, instance.address, instance.status);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod model;
pub mod promql;
pub mod sample;
pub mod timeline;

// Re-export main types for convenience
pub use client::{ActiveTarget, MetricsBackend, PrometheusClient, DEFAULT_QUERY_TIMEOUT};
pub use engine::{EngineOptions, Refresh, StatusEngine};
pub use error::QueryError;
pub use model::{Application, Health, Instance, Point, QueryValue, Sample, Status, Target};
pub use sample::SampleMetric;
