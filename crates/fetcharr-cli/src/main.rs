// SPDX-License-Identifier: GPL-3.0-or-later
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::serve;
use fetcharr_api::router;
use fetcharr_application::{AppState, DownloadClient, NzbgetClient, QbittorrentClient};
use fetcharr_config::{load as load_config, AppConfig};
use fetcharr_scheduler::Scheduler;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config(None)?;
    let clients = build_clients(&config);
    let state = AppState::with_clients(config.clone(), clients);
    state.on_start();

    let mut scheduler = Scheduler::new(&config.scheduler);
    scheduler.register_jobs(state.queue.clone());
    scheduler.start();

    let listener = TcpListener::bind(bind_addr(&config.http)).await?;
    let addr = listener.local_addr()?;
    info!(target: "cli", "listening on {}", addr);

    serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing() {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn build_clients(config: &AppConfig) -> Vec<Arc<dyn DownloadClient>> {
    let mut clients: Vec<Arc<dyn DownloadClient>> = Vec::new();

    if let Some(nzbget) = &config.download_clients.nzbget {
        clients.push(Arc::new(NzbgetClient::new(
            "nzbget",
            nzbget.base_url.clone(),
            nzbget.username.clone(),
            nzbget.password.clone(),
            nzbget.category.clone(),
            config.download_clients.history_limit,
        )));
    }

    if let Some(qbittorrent) = &config.download_clients.qbittorrent {
        clients.push(Arc::new(QbittorrentClient::new(
            "qbittorrent",
            qbittorrent.base_url.clone(),
            qbittorrent.username.clone(),
            qbittorrent.password.clone(),
            qbittorrent.category.clone(),
        )));
    }

    clients
}

fn bind_addr(http: &fetcharr_config::HttpConfig) -> SocketAddr {
    let addr = format!("{}:{}", http.host, http.port);
    addr.parse().expect("valid listen address")
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let mut interrupt = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
        .expect("install SIGINT handler");

    #[cfg(unix)]
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("install SIGTERM handler");

    #[cfg(not(unix))]
    let interrupt = tokio::signal::ctrl_c();

    #[cfg(unix)]
    tokio::select! {
        _ = interrupt.recv() => {},
        _ = terminate.recv() => {},
    }

    #[cfg(not(unix))]
    {
        interrupt.await.expect("ctrl_c handler");
    }

    info!(target: "cli", "shutdown signal received");
}
