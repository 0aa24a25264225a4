//! Process entry point: load configuration, wire providers and debrid
//! resolvers, start the HTTP server, and shut down cleanly on signal.

use std::sync::Arc;

use clap::Parser;
use gateway_api::state::AppState;
use gateway_core::config::GatewayConfig;
use gateway_providers::debrid::cache::DebridCaches;
use gateway_providers::debrid::{AllDebridResolver, DebridRegistry, OffcloudResolver, PremiumizeResolver, RealDebridResolver, TorBoxResolver};
use gateway_providers::direct_host::DirectHostProvider;
use gateway_providers::torrent_a::TorrentIndexAProvider;
use gateway_providers::torrent_b::TorrentIndexBProvider;
use gateway_providers::traits::ProviderRegistry;
use tokio::sync::Semaphore;

/// Aggregation gateway: fans out to torrent and direct-host indexers,
/// scores and selects the best candidate stream, and resolves it through
/// an optional debrid provider at click time.
#[derive(Debug, Parser)]
#[command(name = "gateway", version)]
struct Cli {
    /// Path to an optional YAML config file, overlaid by `GATEWAY_*` env vars.
    #[arg(long, env = "GATEWAY_CONFIG")]
    config: Option<String>,

    /// Overrides the configured listen port.
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

fn build_providers(config: &GatewayConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(TorrentIndexAProvider::new(config.providers.torrent_index_a_base_url.clone())));
    registry.register(Arc::new(TorrentIndexBProvider::new(config.providers.torrent_index_b_base_url.clone())));
    registry.register(Arc::new(DirectHostProvider::new(config.providers.direct_host_base_url.clone())));
    registry
}

/// All five debrid resolvers share one small semaphore so a burst of
/// click-time resolves never hammers a single provider harder than the
/// configured `debrid_semaphore_permits`.
fn build_debrid_registry(config: &GatewayConfig) -> DebridRegistry {
    let mut registry = DebridRegistry::new();
    let caches = || DebridCaches::new(config.cache.debrid_file_list_capacity, config.cache.debrid_unlock_capacity);
    let semaphore = Arc::new(Semaphore::new(config.concurrency.debrid_semaphore_permits));

    registry.register(Arc::new(RealDebridResolver::new(
        config.providers.realdebrid_base_url.clone(),
        caches(),
        semaphore.clone(),
    )));
    registry.register(Arc::new(AllDebridResolver::new(
        config.providers.alldebrid_base_url.clone(),
        caches(),
        semaphore.clone(),
    )));
    registry.register(Arc::new(PremiumizeResolver::new(
        config.providers.premiumize_base_url.clone(),
        caches(),
        semaphore.clone(),
    )));
    registry.register(Arc::new(TorBoxResolver::new(
        config.providers.torbox_base_url.clone(),
        caches(),
        semaphore.clone(),
    )));
    registry.register(Arc::new(OffcloudResolver::new(
        config.providers.offcloud_base_url.clone(),
        caches(),
        semaphore,
    )));
    registry
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match GatewayConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            std::process::exit(78); // EX_CONFIG
        }
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if let Err(err) = gateway_core::logging::init_logging(&config.logging) {
        eprintln!("failed to initialize logging: {err}");
        std::process::exit(78);
    }

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        secure_mode = config.server.secure_mode,
        "starting gateway"
    );

    let providers = build_providers(&config);
    let debrid = build_debrid_registry(&config);
    let state = AppState::new(config.clone(), providers, debrid);

    let app = gateway_api::app(state);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(address = %address, error = %err, "failed to bind listen address");
            std::process::exit(69); // EX_UNAVAILABLE
        }
    };

    tracing::info!(address = %address, "gateway listening");

    let serve_result = axum::serve(listener, app.into_make_service_with_connect_info::<std::net::SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    match serve_result {
        Ok(()) => {
            tracing::info!("gateway shut down cleanly");
            std::process::exit(0);
        }
        Err(err) => {
            tracing::error!(error = %err, "gateway server error");
            std::process::exit(1);
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
