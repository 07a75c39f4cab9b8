//! Check command implementation.
//!
//! Validates configuration and backend connectivity.

use herakles_target_monitor::StatusEngine;

use crate::config::{validate_effective_config, Config};

/// Validates configuration, verifies the backend and runs one discovery.
pub async fn command_check(
    engine: &StatusEngine,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles Target Monitor - Backend Check");
    println!("==========================================");

    let mut all_ok = true;

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    // Check backend connectivity
    println!("\n📡 Checking backend {}...", config.prom_endpoint());
    match engine.verify().await {
        Ok(()) => println!("   ✅ Backend answers instant queries"),
        Err(e) => {
            println!("   ❌ Backend verification failed: {}", e);
            all_ok = false;
        }
    }

    // Check target discovery and timeline probes
    if all_ok {
        println!("\n🎯 Resolving targets...");
        match engine.refresh().await {
            Ok(refresh) => {
                println!(
                    "   ✅ {} targets in {} applications",
                    refresh.targets,
                    refresh.applications.len()
                );
                if refresh.degraded_probes > 0 {
                    println!(
                        "   ⚠️  {} timeline probes failed and were treated as not found",
                        refresh.degraded_probes
                    );
                }
            }
            Err(e) => {
                println!("   ❌ Target discovery failed: {}", e);
                all_ok = false;
            }
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - backend is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
