//! tgpilot binary.
//!
//! Start the server with:
//! ```bash
//! PORT=3000 APP_ENV=development cargo run -p tgpilot --features mtproto
//! ```

mod cli;

use std::sync::Arc;

use clap::Parser;
use tgpilot_api::{serve, AppState};
use tgpilot_protocol::ProtocolConnector;
use tgpilot_runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Args;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env.local or .env before clap reads the environment
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());

    let args = Args::parse();
    let api_config = args.api_config();

    // RUST_LOG wins over the verbosity flag
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(args.log_filter()))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(!api_config.is_production())
        .init();

    let runtime = Arc::new(Runtime::new(args.runtime_config(), connector()));
    let state = AppState::new(api_config.clone(), Arc::clone(&runtime));

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %api_config.environment,
        "starting tgpilot"
    );
    serve(api_config, state, shutdown_signal()).await?;

    runtime.shutdown().await;
    info!("tgpilot stopped");
    Ok(())
}

#[cfg(feature = "mtproto")]
fn connector() -> Arc<dyn ProtocolConnector> {
    Arc::new(tgpilot_protocol::grammers::GrammersConnector::new())
}

#[cfg(not(feature = "mtproto"))]
fn connector() -> Arc<dyn ProtocolConnector> {
    warn!("built without the mtproto feature; every connect will fail");
    Arc::new(tgpilot_protocol::OfflineConnector::new(
        "no protocol backend; rebuild with --features mtproto",
    ))
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
