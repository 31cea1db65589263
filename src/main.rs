//! StackScout - Main application entry point

use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, signal};

use stackscout::{
    Config,
    application::DiscoveryEngine,
    infrastructure::{AggregatingToolRepository, build_sources},
    init_tracing,
    presentation::{AppState, create_router},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({e}), using defaults");
        Config::default()
    });

    init_tracing(&config.logging)?;

    tracing::info!("Starting StackScout server...");
    tracing::info!(
        "Configuration loaded: server={}:{}",
        config.server.host,
        config.server.port
    );

    if config.sources.github.token().is_none() {
        tracing::info!("GitHub token not provided; GitHub searches run on the anonymous budget");
    }

    // One adapter per enabled source, each with its own limiter and cache
    let sources = build_sources(&config)?;
    let repository = Arc::new(AggregatingToolRepository::new(sources));
    tracing::info!(sources = ?repository.source_types(), "Tool sources ready");

    let engine = DiscoveryEngine::new(repository, config.discovery.clone())?;

    let app_state = AppState {
        discovery_service: Arc::new(engine),
        config: Arc::new(config.clone()),
    };

    let app = create_router(app_state, &config);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    tracing::info!("Server listening on {}", addr);
    if config.server.enable_docs {
        tracing::info!("API documentation available at http://{}/docs", addr);
    } else {
        tracing::info!("API documentation disabled (enable_docs=false)");
    }

    // Start server with graceful shutdown
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
