//! One-shot `apps` and `sample` commands.
//!
//! Both run the same engine calls as the HTTP endpoints and print JSON to
//! stdout, which makes them handy for scripting and debugging label setups.

use serde::Serialize;

use herakles_target_monitor::StatusEngine;

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), Box<dyn std::error::Error>> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

/// Resolves all applications once and prints them.
pub async fn command_apps(
    engine: &StatusEngine,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let refresh = engine.refresh().await?;
    if refresh.degraded_probes > 0 {
        eprintln!(
            "⚠️  {} timeline probes failed and were treated as not found",
            refresh.degraded_probes
        );
    }
    print_json(&refresh.applications, pretty)
}

/// Runs the combined sample query once and prints it (`null` when empty).
pub async fn command_sample(
    engine: &StatusEngine,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let sample = engine.sample().await?;
    print_json(&sample, pretty)
}
