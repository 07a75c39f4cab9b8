//! CLI command implementations for herakles-target-monitor.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Backend connectivity and configuration validation
//! - `config`: Configuration file generation
//! - `apps`: One-shot application status
//! - `sample`: One-shot combined sample

pub mod apps;
pub mod check;
pub mod config;

// Re-export command functions
pub use apps::{command_apps, command_sample};
pub use check::command_check;
pub use config::command_config;
