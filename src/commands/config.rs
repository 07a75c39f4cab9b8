//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from(default_file_name(&format)),
    };

    let mut content = render_config(&config, &format)?;
    if matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

fn default_file_name(format: &ConfigFormat) -> &'static str {
    match format {
        ConfigFormat::Yaml => "herakles-target-monitor.yaml",
        ConfigFormat::Json => "herakles-target-monitor.json",
        ConfigFormat::Toml => "herakles-target-monitor.toml",
    }
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles Target Monitor Configuration
# ======================================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 9216                   # HTTP port
# prefix: null                 # URL path prefix for all endpoints (e.g. "gmon")
#
# Prometheus Backend
# ------------------
# prom_host: "localhost"       # Prometheus host
# prom_port: 9090              # Prometheus port
# prom_scheme: "http"          # "http" or "https"
# query_timeout_secs: 5        # Per-request timeout
#
# Status Resolution
# -----------------
# lookback_days: 15            # Window searched for up/down transitions
# refresh_interval_secs: 2     # Interval between /event updates
# refresh_timeout_secs: 30     # Deadline for one complete refresh
# max_concurrency: 16          # Targets resolved at the same time
#
# Sample Metrics
# --------------
# sample_metrics:              # Joined with "or" into one instant query;
#   - name: mem_used_bytes     # every series is keyed "<instance>,<name>"
#     expr: sum by (job, instance) (go_memstats_sys_bytes{job="go"})
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
#
# TLS/SSL Configuration
# ---------------------
# enable_tls: false            # Enable HTTPS (default: false)
# tls_cert_path: null          # Path to TLS certificate (PEM format)
# tls_key_path: null           # Path to TLS private key (PEM format)
"#;

    format!("{comments}\n{yaml}")
}
