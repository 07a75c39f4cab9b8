//! HTTP endpoint handlers for the status service.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/`: Landing page
//! - `/apps`: Grouped application status (JSON)
//! - `/sample`: Combined resource sample (JSON)
//! - `/event`: Live apps + sample stream (Server-Sent Events)
//! - `/health`: Health check endpoint
//! - `/metrics`: Prometheus self-telemetry
//! - `/config`: Configuration display endpoint

pub mod apps;
pub mod config;
pub mod event;
pub mod health;
pub mod metrics;
pub mod root;
pub mod sample;

// Re-export handlers
pub use apps::apps_handler;
pub use config::config_handler;
pub use event::event_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use root::root_handler;
pub use sample::sample_handler;
