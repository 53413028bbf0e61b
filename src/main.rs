//! Gatehouse - HTTP server entry point

use std::net::SocketAddr;
use std::time::Duration;
use tokio::{net::TcpListener, signal};

use gatehouse::{AppHandle, Config, create_app, drain_background_tasks, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    let config = Config::load().map_err(|e| {
        std::io::Error::other(format!(
            "Failed to load configuration. Check DATABASE_URL and GATEHOUSE__* env vars: {}",
            e
        ))
    })?;

    init_tracing(&config.logging)?;

    tracing::info!("Starting Gatehouse server...");
    tracing::info!(
        "Configuration loaded: server={}:{}",
        config.server.host,
        config.server.port
    );

    let server_host = config.server.host.clone();
    let server_port = config.server.port;
    let enable_docs = config.server.enable_docs;
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);

    let app_handle = create_app(config).await.map_err(|e| {
        Box::new(std::io::Error::other(format!(
            "Failed to create application: {}",
            e
        )))
    })?;

    let addr = SocketAddr::new(server_host.parse()?, server_port);

    tracing::info!("Server listening on {}", addr);
    if enable_docs {
        tracing::info!("OpenAPI document available at http://{}/api-docs/openapi.json", addr);
    }

    // Peer addresses feed the per-caller rate limit keys
    let listener = TcpListener::bind(addr).await?;
    let AppHandle {
        router,
        shutdown_token,
        background_tasks,
    } = app_handle;

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(termination_requested())
    .await?;

    tracing::info!("Listener closed, stopping background tasks");
    drain_background_tasks(&shutdown_token, background_tasks, shutdown_timeout).await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves on the first SIGINT or SIGTERM
async fn termination_requested() {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal as unix_signal};

        let mut sigterm = match unix_signal(SignalKind::terminate()) {
            Ok(stream) => Some(stream),
            Err(e) => {
                tracing::error!("SIGTERM handler unavailable: {}", e);
                None
            }
        };
        let sigterm_received = async {
            match sigterm.as_mut() {
                Some(stream) => {
                    stream.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!("SIGINT handler unavailable: {}", e);
                }
                tracing::info!("SIGINT received, draining connections");
            }
            _ = sigterm_received => {
                tracing::info!("SIGTERM received, draining connections");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("SIGINT handler unavailable: {}", e);
        }
        tracing::info!("SIGINT received, draining connections");
    }
}
