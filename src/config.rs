//! Configuration management for herakles-target-monitor.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use herakles_target_monitor::sample::{default_metrics, SampleMetric};
pub use herakles_target_monitor::engine::DEFAULT_MAX_CONCURRENCY;
use herakles_target_monitor::EngineOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9216;
pub const DEFAULT_PROM_HOST: &str = "localhost";
pub const DEFAULT_PROM_PORT: u16 = 9090;
pub const DEFAULT_PROM_SCHEME: &str = "http";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_LOOKBACK_DAYS: u64 = 15;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 30;

/// Upper bound for `max_concurrency`.
const MAX_CONCURRENCY_LIMIT: usize = 1024;
/// Upper bound for `lookback_days` (about ten years).
const MAX_LOOKBACK_DAYS: u64 = 3650;
const SECONDS_PER_DAY: u64 = 86_400;

/// Enhanced configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,
    /// URL path prefix, without leading or trailing slash
    pub prefix: Option<String>,

    // Prometheus backend
    #[serde(alias = "prom-host")]
    pub prom_host: Option<String>,
    #[serde(alias = "prom-port")]
    pub prom_port: Option<u16>,
    /// "http" | "https"
    #[serde(alias = "prom-scheme")]
    pub prom_scheme: Option<String>,
    #[serde(alias = "query-timeout-secs")]
    pub query_timeout_secs: Option<u64>,

    // Status resolution
    #[serde(alias = "lookback-days")]
    pub lookback_days: Option<u64>,
    #[serde(alias = "refresh-interval-secs")]
    pub refresh_interval_secs: Option<u64>,
    #[serde(alias = "refresh-timeout-secs")]
    pub refresh_timeout_secs: Option<u64>,
    #[serde(alias = "max-concurrency")]
    pub max_concurrency: Option<usize>,

    // Logging
    pub log_level: Option<String>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,

    /// Sub-expressions of the combined sample query (kept last: TOML tables follow values)
    #[serde(alias = "sample-metrics")]
    pub sample_metrics: Option<Vec<SampleMetric>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            prefix: None,
            prom_host: Some(DEFAULT_PROM_HOST.to_string()),
            prom_port: Some(DEFAULT_PROM_PORT),
            prom_scheme: Some(DEFAULT_PROM_SCHEME.to_string()),
            query_timeout_secs: Some(DEFAULT_QUERY_TIMEOUT_SECS),
            lookback_days: Some(DEFAULT_LOOKBACK_DAYS),
            refresh_interval_secs: Some(DEFAULT_REFRESH_INTERVAL_SECS),
            refresh_timeout_secs: Some(DEFAULT_REFRESH_TIMEOUT_SECS),
            max_concurrency: Some(DEFAULT_MAX_CONCURRENCY),
            sample_metrics: Some(default_metrics()),
            log_level: Some("info".into()),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Config {
    /// Normalized route prefix: "" or "/name".
    pub fn route_prefix(&self) -> String {
        match self.prefix.as_deref().map(|p| p.trim_matches('/')) {
            Some(p) if !p.is_empty() => format!("/{}", p),
            _ => String::new(),
        }
    }

    pub fn prom_endpoint(&self) -> String {
        format!(
            "{}://{}:{}",
            self.prom_scheme.as_deref().unwrap_or(DEFAULT_PROM_SCHEME),
            self.prom_host.as_deref().unwrap_or(DEFAULT_PROM_HOST),
            self.prom_port.unwrap_or(DEFAULT_PROM_PORT)
        )
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs.unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(
            self.refresh_interval_secs
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS),
        )
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(
            self.refresh_timeout_secs
                .unwrap_or(DEFAULT_REFRESH_TIMEOUT_SECS),
        )
    }

    /// Engine tunables derived from this configuration.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            lookback: Duration::from_secs(
                self.lookback_days
                    .unwrap_or(DEFAULT_LOOKBACK_DAYS)
                    .saturating_mul(SECONDS_PER_DAY),
            ),
            max_concurrency: self.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY),
            sample_metrics: self
                .sample_metrics
                .clone()
                .unwrap_or_else(default_metrics),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    // Backend validation
    if cfg.prom_host.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return Err("prom_host must not be empty".into());
    }

    match cfg.prom_scheme.as_deref().unwrap_or(DEFAULT_PROM_SCHEME) {
        "http" | "https" => {}
        other => {
            return Err(format!(
                "Invalid prom_scheme '{}', expected 'http' or 'https'",
                other
            )
            .into());
        }
    }

    if cfg.query_timeout_secs == Some(0) {
        return Err("query_timeout_secs must be greater than 0".into());
    }
    if cfg.refresh_interval_secs == Some(0) {
        return Err("refresh_interval_secs must be greater than 0".into());
    }
    if cfg.refresh_timeout_secs == Some(0) {
        return Err("refresh_timeout_secs must be greater than 0".into());
    }

    if let Some(n) = cfg.max_concurrency {
        if n == 0 || n > MAX_CONCURRENCY_LIMIT {
            return Err(format!(
                "max_concurrency must be between 1 and {}, got {}",
                MAX_CONCURRENCY_LIMIT, n
            )
            .into());
        }
    }

    if let Some(days) = cfg.lookback_days {
        if days == 0 || days > MAX_LOOKBACK_DAYS {
            return Err(format!(
                "lookback_days must be between 1 and {}, got {}",
                MAX_LOOKBACK_DAYS, days
            )
            .into());
        }
    }

    // Prefix validation
    if let Some(prefix) = cfg.prefix.as_deref() {
        if prefix.chars().any(|c| c.is_whitespace() || c == '?' || c == '#') {
            return Err(format!("Invalid prefix '{}'", prefix).into());
        }
    }

    // Sample metric validation
    if let Some(metrics) = &cfg.sample_metrics {
        for (i, metric) in metrics.iter().enumerate() {
            if metric.name.trim().is_empty() {
                return Err(format!("sample_metrics[{}] has an empty name", i).into());
            }
            if metric.expr.trim().is_empty() {
                return Err(
                    format!("sample_metrics[{}] ('{}') has an empty expr", i, metric.name).into(),
                );
            }
        }
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                return Err(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                );
            }
            (Some(_), None) => {
                return Err("TLS is enabled but tls_key_path is not set".into());
            }
            (None, Some(_)) => {
                return Err("TLS is enabled but tls_cert_path is not set".into());
            }
            (Some(cert), Some(key)) => {
                check_pem_file(cert, "certificate")?;
                check_pem_file(key, "private key")?;
            }
        }
    }

    Ok(())
}

/// Checks that a TLS file exists, is readable and not empty.
fn check_pem_file(path: &str, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    let p = Path::new(path);
    if !p.exists() {
        return Err(format!("TLS {} file not found: {}", what, path).into());
    }
    match fs::metadata(p) {
        Ok(meta) if meta.len() == 0 => Err(format!("TLS {} file is empty: {}", what, path).into()),
        Err(e) => Err(format!("TLS {} file is not readable: {} ({})", what, path, e).into()),
        Ok(_) => Ok(()),
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref().and_then(|p| p.to_str()))?
    };

    // Override with CLI args
    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }
    if let Some(prefix) = &args.prefix {
        config.prefix = Some(prefix.clone());
    }

    // Backend settings
    if let Some(host) = &args.prom_host {
        config.prom_host = Some(host.clone());
    }
    if let Some(port) = args.prom_port {
        config.prom_port = Some(port);
    }
    if let Some(timeout) = args.query_timeout_secs {
        config.query_timeout_secs = Some(timeout);
    }

    // Resolution settings
    if let Some(days) = args.lookback_days {
        config.lookback_days = Some(days);
    }
    if let Some(interval) = args.refresh_interval_secs {
        config.refresh_interval_secs = Some(interval);
    }
    if let Some(timeout) = args.refresh_timeout_secs {
        config.refresh_timeout_secs = Some(timeout);
    }
    if let Some(n) = args.max_concurrency {
        config.max_concurrency = Some(n);
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Enhanced configuration loading with multiple format support
pub fn load_config(path: Option<&str>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        PathBuf::from(p)
    } else {
        // Try default locations
        let defaults = [
            "/etc/herakles/target-monitor.yaml",
            "/etc/herakles/target-monitor.yml",
            "/etc/herakles/target-monitor.json",
            "./herakles-target-monitor.yaml",
            "./herakles-target-monitor.yml",
            "./herakles-target-monitor.json",
        ];

        defaults
            .iter()
            .find(|p| Path::new(p).exists())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(""))
    };

    if !path.exists() || path.to_string_lossy().is_empty() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;
    let config = parse_config(&content, path.extension().and_then(|s| s.to_str()))?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Parses configuration content by file extension (YAML when unknown).
pub fn parse_config(
    content: &str,
    extension: Option<&str>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match extension {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        _ => serde_yaml::from_str(content)?,
    };
    Ok(config)
}

/// Renders configuration in the requested format
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}
