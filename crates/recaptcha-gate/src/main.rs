//! # Recaptcha Gate - demo server
//!
//! Serves a handful of form endpoints, each behind a different gate policy.
//!
//! ## Architecture
//! ```text
//! Client → identify → gate (policy) → handler
//!                        ↓
//!                 siteverify endpoint
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use recaptcha_gate::config::{self, AppConfig, ConfigOverrides};
use recaptcha_gate::routes;
use recaptcha_gate::state::AppState;

/// reCAPTCHA gate demo server
#[derive(Parser, Debug)]
#[command(name = "recaptcha-gate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/recaptcha-gate.toml")]
    config: String,

    /// reCAPTCHA secret key (overrides config)
    #[arg(long, env = "RECAPTCHA_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Accept every token without calling the verification service
    #[arg(long, default_value = "false")]
    disable_verification: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_level, args.json_logs)?;

    info!("Starting recaptcha-gate v{}", env!("CARGO_PKG_VERSION"));

    let overrides = ConfigOverrides {
        secret_key: args.secret_key.clone(),
        listen_addr: args.listen.clone(),
        disable_verification: args.disable_verification,
    };
    let config = AppConfig::load(&args.config, &overrides)?;
    info!(path = %args.config, enabled = config.gate.enabled, "Configuration loaded");

    if config.gate.secret().is_none() {
        tracing::warn!("No reCAPTCHA secret key configured; gated routes will fail");
    }

    // Gates built elsewhere in the process without a config fall back to this one
    config::install_global(config.gate.clone()).context("Failed to install gate configuration")?;

    let state = AppState::new(&config).context("Failed to initialise application state")?;
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
            .context("Failed to initialise logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
            .context("Failed to initialise logging")?;
    }

    Ok(())
}
