//! CLI arguments and subcommands for herakles-target-monitor.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-target-monitor",
    about = "Per-application up/down status board for Prometheus scrape targets",
    long_about = "Per-application up/down status board for Prometheus scrape targets.\n\n\
                  Groups the active targets of a Prometheus server by application, resolves \
                  for every instance since when it has been up or down from the `up` history, \
                  and serves the result as JSON and as a live Server-Sent Events stream.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = "0.1.0",
    propagate_version = true,
    after_help = "Project: https://github.com/cansp-dev/herakles-target-monitor | More info: https://www.herakles.now | Support: exporter@herakles.now"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// URL path prefix for all endpoints (e.g. "monitor")
    #[arg(long)]
    pub prefix: Option<String>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Prometheus host
    #[arg(long)]
    pub prom_host: Option<String>,

    /// Prometheus port
    #[arg(long)]
    pub prom_port: Option<u16>,

    /// Per-request timeout against Prometheus in seconds
    #[arg(long)]
    pub query_timeout_secs: Option<u64>,

    /// Lookback window in days for up/down history
    #[arg(long)]
    pub lookback_days: Option<u64>,

    /// Interval between live event stream updates in seconds
    #[arg(long)]
    pub refresh_interval_secs: Option<u64>,

    /// Deadline for one complete refresh in seconds
    #[arg(long)]
    pub refresh_timeout_secs: Option<u64>,

    /// Maximum number of targets resolved concurrently
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Enable TLS/SSL for HTTPS
    #[arg(long)]
    pub enable_tls: bool,

    /// Path to TLS certificate file (PEM format)
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM format)
    #[arg(long)]
    pub tls_key: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify connectivity to the Prometheus backend
    Check,

    /// Generate configuration files
    Config {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },

    /// Resolve all applications once and print them as JSON
    Apps {
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Run the combined sample query once and print it as JSON
    Sample {
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}
