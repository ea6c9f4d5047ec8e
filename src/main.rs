//! Workflow gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ cors ─▶ rate limit ─▶ handler
//!                                                     │              │
//!                                          SlidingWindowLimiter   filename check
//!                                                                    │
//!                                                                    ▼
//!                                                            workflows/<name>.json
//! ```
//!
//! Startup: CLI → config → logging → requirements → directories → metrics → listener.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use workflow_gate::config::{load_config, GatewayConfig};
use workflow_gate::http::HttpServer;
use workflow_gate::lifecycle::{check_requirements, ensure_storage, shutdown_signal, Shutdown};
use workflow_gate::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "workflow-gate")]
#[command(about = "Workflow file gateway with filename validation and per-IP rate limiting")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,

    /// Override observability.log_level
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(level) = args.log_level {
        config.observability.log_level = level;
    }

    logging::init(&config.observability.log_level);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        "workflow-gate starting"
    );

    if !check_requirements(&config) {
        return Err("startup requirements not met".into());
    }
    ensure_storage(&config.storage)?;

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.trigger();
    });

    HttpServer::new(config).run(listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
