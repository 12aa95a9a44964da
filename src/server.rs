use crate::api::{create_router, AppState, CONTACT_PATH, HEALTH_PATH, NEWSLETTER_PATH};
use crate::config::RelayConfig;
use crate::core::rate_limit::spawn_sweeper;
use crate::utils::error::Result;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

/// Binds the configured address and serves until Ctrl-C / SIGTERM.
pub async fn run(config: RelayConfig) -> Result<()> {
    let state = AppState::from_config(&config)?;

    let address = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;

    tracing::info!(
        environment = config.mode.as_str(),
        transport = state.engine.transport_kind(),
        "meanx.ai relay running on http://{address}"
    );
    tracing::info!("Available endpoints:");
    tracing::info!("  GET  {HEALTH_PATH}          Health check");
    tracing::info!("  POST {CONTACT_PATH}         Contact form");
    tracing::info!("  POST {NEWSLETTER_PATH}      Newsletter signup");

    serve(listener, state, &config, shutdown_signal()).await?;

    tracing::info!("Relay stopped");
    Ok(())
}

/// Serves on an already bound listener; used by `run` and by end-to-end tests.
pub async fn serve<F>(
    listener: TcpListener,
    state: AppState,
    config: &RelayConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let sweeper = spawn_sweeper(
        state.limiters(),
        Duration::from_secs(config.server.sweep_interval_seconds),
    );

    let app = create_router(state, config);
    let result = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await;

    sweeper.abort();
    result?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
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
}
