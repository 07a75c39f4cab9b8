//! herakles-target-monitor - version 0.1.0
//!
//! Per-application up/down status service for Prometheus scrape targets.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod health_stats;
mod metrics;
mod state;
mod status_updater;

use axum::{routing::get, Router};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info, level_filters::LevelFilter};

use herakles_target_monitor::{PrometheusClient, StatusEngine};

use cli::{Args, Commands, LogLevel};
use commands::{command_apps, command_check, command_config, command_sample};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR, DEFAULT_PORT,
};
use handlers::{
    apps_handler, config_handler, event_handler, health_handler, metrics_handler, root_handler,
    sample_handler,
};
use state::{AppState, SharedState};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(args: &Args) {
    let log_level = match args.log_level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("⚠️  Tracing subscriber already set - keeping existing one");
        return;
    }

    info!("Logging initialized with level: {:?}", args.log_level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Builds the status engine against the configured Prometheus endpoint.
fn build_engine(config: &Config) -> Result<StatusEngine, Box<dyn std::error::Error>> {
    let client = PrometheusClient::new(config.prom_endpoint(), config.query_timeout())?;
    debug!("Prometheus client configured for {}", client.endpoint());
    Ok(StatusEngine::new(Arc::new(client), config.engine_options()))
}

/// Builds the HTTP router, nested under the configured prefix.
fn build_router(state: SharedState) -> Router {
    let routes = Router::new()
        .route("/", get(root_handler))
        .route("/apps", get(apps_handler))
        .route("/sample", get(sample_handler))
        .route("/event", get(event_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/config", get(config_handler));

    let prefix = state.config.route_prefix();
    let app = if prefix.is_empty() {
        routes
    } else {
        debug!("Serving all endpoints under {}", prefix);
        Router::new().nest(&prefix, routes)
    };

    app.with_state(state)
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        if let Commands::Config { output, format } = command {
            return command_config(output.clone(), format.clone());
        }

        setup_logging(&args);
        let config = load_validated_config(&args)?;
        let engine = build_engine(&config)?;

        return match command {
            Commands::Check => command_check(&engine, &config).await,
            Commands::Apps { pretty } => command_apps(&engine, *pretty).await,
            Commands::Sample { pretty } => command_sample(&engine, *pretty).await,
            Commands::Config { .. } => unreachable!("Config handled above"),
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;

    setup_logging(&args);

    info!("Starting herakles-target-monitor");

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR).to_string();
    let port = config.port.unwrap_or(DEFAULT_PORT);

    let engine = build_engine(&config)?;

    // Startup verification is fatal: never serve without a reachable backend
    info!("Verifying backend at {}", config.prom_endpoint());
    if let Err(e) = engine.verify().await {
        error!("❌ Backend verification failed: {}", e);
        return Err(e.into());
    }
    info!("✅ Backend verified");

    let state: SharedState = Arc::new(AppState::new(engine, config.clone())?);
    debug!("Prometheus registry initialized");

    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;
    let app = build_router(state);
    let prefix = config.route_prefix();

    // Check if TLS is enabled
    if config.enable_tls.unwrap_or(false) {
        let (Some(cert_path), Some(key_path)) =
            (config.tls_cert_path.as_ref(), config.tls_key_path.as_ref())
        else {
            return Err("TLS is enabled but certificate or key path is missing".into());
        };

        info!("Loading TLS certificate from: {}", cert_path);
        info!("Loading TLS private key from: {}", key_path);

        let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .map_err(|e| {
                error!("Failed to load TLS configuration: {}", e);
                e
            })?;

        info!(
            "herakles-target-monitor listening on https://{}:{}{}",
            bind_ip_str, port, prefix
        );

        let server = axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service());

        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!("Server error: {}", e);
                    return Err(e.into());
                }
            }
            _ = shutdown_signal() => {
                info!("Shutdown signal received, exiting...");
            }
        }
    } else {
        let listener = TcpListener::bind(addr).await?;
        info!(
            "herakles-target-monitor listening on http://{}:{}{}",
            bind_ip_str, port, prefix
        );

        // Open event streams never finish on their own, so shutdown does not wait for them
        let server = axum::serve(listener, app);

        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!("Server error: {}", e);
                    return Err(e.into());
                }
            }
            _ = shutdown_signal() => {
                info!("Shutdown signal received, exiting...");
            }
        }
    }

    info!("herakles-target-monitor stopped gracefully");
    Ok(())
}
