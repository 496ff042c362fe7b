mod api;
mod auth;
mod cache;
mod config;
mod dto;
mod error;
mod extract;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::time::Duration;

use regdesk_core::Sweeper;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "regdesk_web=debug,regdesk_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::load()?;
    let bind_addr = config.bind_addr;
    let tls_config = config.tls.clone();
    let limits = config.rate_limit.clone();

    let state = AppState::new(config);

    let login_sweeper = Sweeper::spawn(
        state.login_limiter.clone(),
        Duration::from_secs(limits.login_sweep_secs),
    );
    let status_sweeper = Sweeper::spawn(
        state.status_limiter.clone(),
        Duration::from_secs(limits.status_sweep_secs),
    );

    // Response cache cleanup task
    let cleanup_cache = state.cache.clone();
    let cache_cleanup = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            cleanup_cache.cleanup_expired();
            tracing::debug!(entries = cleanup_cache.len(), "response cache cleanup");
        }
    });

    let app = api::app(state).into_make_service_with_connect_info::<SocketAddr>();

    if let (Some(cert), Some(key)) = (&tls_config.cert_path, &tls_config.key_path) {
        use axum_server::tls_rustls::RustlsConfig;
        let rustls_config = RustlsConfig::from_pem_file(cert, key).await?;

        let handle = axum_server::Handle::new();
        let shutdown = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        tracing::info!("regdesk-web listening on https://{}", bind_addr);
        axum_server::bind_rustls(bind_addr, rustls_config)
            .handle(handle)
            .serve(app)
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        tracing::info!("regdesk-web listening on http://{}", bind_addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    }

    login_sweeper.stop().await;
    status_sweeper.stop().await;
    cache_cleanup.abort();
    tracing::info!("regdesk-web stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
