//! data-proxy - HTTP gateway that signs and forwards log payloads to
//! per-workspace Log Analytics endpoints.
//!
//! ```text
//! data-proxy config.yaml
//! CONFIG_YAML_CONTENT=$(base64 -w 0 config.yaml) data-proxy
//! ```

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use data_proxy::config::{self, defaults};
use data_proxy::forwarder::{ForwarderConfig, ForwardingClient};
use data_proxy::gateway::{AppState, router};
use data_proxy::logging_layer::{init_tracing, install_panic_hook};
use data_proxy::registry::WorkspaceRegistry;
use data_proxy::stats::StatsCollector;
use data_proxy::version::{UNKNOWN_SHA256, VersionInfo};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Command line options.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the YAML config file
    config: Option<PathBuf>,

    /// Base64-encoded YAML config, used when no path is given
    #[arg(long, env = defaults::CONFIG_ENV_VAR, hide_env_values = true)]
    config_content: Option<String>,

    /// Log filter when RUST_LOG is unset (default: info)
    #[arg(long, env = "DATA_PROXY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Graceful shutdown timeout in seconds (default: 30)
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value = "30")]
    shutdown_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level);
    install_panic_hook();

    let version = VersionInfo::current().unwrap_or_else(|e| {
        warn!(error = %e, "Cannot hash the running binary");
        VersionInfo::new(env!("CARGO_PKG_VERSION"), UNKNOWN_SHA256)
    });

    let config = config::load_from_sources(cli.config.as_deref(), cli.config_content.as_deref())
        .inspect_err(|e| error!(error = %e, config = ?cli.config, "Error loading config"))?;
    let registry = WorkspaceRegistry::build(&config.workspaces)
        .inspect_err(|e| error!(error = %e, "Invalid workspace configuration"))?;
    let forwarder_config = ForwarderConfig::from_backend(&config.backend)
        .inspect_err(|e| error!(error = %e, "Invalid backend configuration"))?;
    let forwarder = ForwardingClient::new(forwarder_config)?;

    info!(
        workspaces = registry.len(),
        named = registry.named_len(),
        backend_host = %forwarder.config().host,
        binary_version = %version.binary_version,
        binary_sha256 = %version.binary_sha256,
        "Successfully loaded config"
    );

    let state = AppState::new(
        registry,
        Arc::new(forwarder),
        Arc::new(StatsCollector::new()),
        version,
    );
    let app = router(state, config.max_body_bytes());

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Listening");

    let shutdown = CancellationToken::new();
    spawn_signal_handlers(shutdown.clone());

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.clone().cancelled_owned());
    let mut server = tokio::spawn(server.into_future());

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        _ = shutdown.cancelled() => {}
    }

    info!(
        timeout_seconds = cli.shutdown_timeout,
        "Waiting for in-flight requests to drain"
    );

    match tokio::time::timeout(Duration::from_secs(cli.shutdown_timeout), server).await {
        Ok(result) => {
            result??;
            info!("All requests drained, shutting down cleanly");
        }
        Err(_) => warn!("Shutdown timeout reached, forcing exit"),
    }

    Ok(())
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
fn spawn_signal_handlers(shutdown: CancellationToken) {
    let on_sigint = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
                on_sigint.cancel();
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGINT");
            }
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown");
                shutdown.cancel();
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
            }
        }
    });
}
