//! Configuration display endpoint handler.
//!
//! This module provides the `/config` endpoint handler that displays
//! the effective service configuration.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::config::{
    Config, DEFAULT_BIND_ADDR, DEFAULT_LOOKBACK_DAYS, DEFAULT_MAX_CONCURRENCY, DEFAULT_PORT,
};
use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

/// Handler for the /config endpoint.
#[instrument(skip(state))]
pub async fn config_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /config request");

    // Track HTTP request
    state.health_stats.record_http_request();

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        render_config_text(&state.config),
    )
}

/// Renders the effective configuration as plain text.
pub fn render_config_text(cfg: &Config) -> String {
    let mut out = String::new();
    let field = |out: &mut String, key: &str, value: String| {
        writeln!(out, "{:28}{}", format!("{}:", key), value).ok();
    };

    writeln!(out, "HERAKLES TARGET MONITOR - CONFIGURATION").ok();
    writeln!(out, "=======================================").ok();
    writeln!(out).ok();

    writeln!(out, "SERVER CONFIGURATION").ok();
    writeln!(out, "--------------------").ok();
    field(
        &mut out,
        "bind",
        cfg.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR).to_string(),
    );
    field(&mut out, "port", cfg.port.unwrap_or(DEFAULT_PORT).to_string());
    let prefix = cfg.route_prefix();
    field(
        &mut out,
        "prefix",
        if prefix.is_empty() { "none".to_string() } else { prefix },
    );
    writeln!(out).ok();

    writeln!(out, "TLS/SSL CONFIGURATION").ok();
    writeln!(out, "---------------------").ok();
    field(
        &mut out,
        "enable_tls",
        cfg.enable_tls.unwrap_or(false).to_string(),
    );
    field(
        &mut out,
        "tls_cert_path",
        cfg.tls_cert_path.as_deref().unwrap_or("none").to_string(),
    );
    field(
        &mut out,
        "tls_key_path",
        cfg.tls_key_path.as_deref().unwrap_or("none").to_string(),
    );
    writeln!(out).ok();

    writeln!(out, "PROMETHEUS BACKEND").ok();
    writeln!(out, "------------------").ok();
    field(&mut out, "endpoint", cfg.prom_endpoint());
    field(
        &mut out,
        "query_timeout",
        format!("{} seconds", cfg.query_timeout().as_secs()),
    );
    writeln!(out).ok();

    writeln!(out, "STATUS RESOLUTION").ok();
    writeln!(out, "-----------------").ok();
    field(
        &mut out,
        "lookback",
        format!("{} days", cfg.lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS)),
    );
    field(
        &mut out,
        "refresh_interval",
        format!("{} seconds", cfg.refresh_interval().as_secs()),
    );
    field(
        &mut out,
        "refresh_timeout",
        format!("{} seconds", cfg.refresh_timeout().as_secs()),
    );
    field(
        &mut out,
        "max_concurrency",
        cfg.max_concurrency
            .unwrap_or(DEFAULT_MAX_CONCURRENCY)
            .to_string(),
    );
    writeln!(out).ok();

    writeln!(out, "SAMPLE METRICS").ok();
    writeln!(out, "--------------").ok();
    let metrics = cfg.engine_options().sample_metrics;
    if metrics.is_empty() {
        writeln!(out, "none (sample queries disabled)").ok();
    }
    for metric in &metrics {
        writeln!(out, "{}: {}", metric.name, metric.expr).ok();
    }
    writeln!(out).ok();

    writeln!(out, "LOGGING").ok();
    writeln!(out, "-------").ok();
    field(
        &mut out,
        "log_level",
        cfg.log_level.as_deref().unwrap_or("info").to_string(),
    );
    writeln!(out).ok();
    writeln!(out, "{FOOTER_TEXT}").ok();

    out
}
