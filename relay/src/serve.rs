use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};

/// Bind, then serve `router` until Ctrl-C or SIGTERM.
pub async fn serve<S: ToSocketAddrs>(addr: S, router: Router, banner: &str) -> std::io::Result<()> {
    let tcp_listener = TcpListener::bind(addr).await?;
    match tcp_listener.local_addr() {
        Ok(local) => tracing::info!("Listening on {}", local),
        Err(err) => tracing::warn!("Could not determine the listening address: {}", err),
    }
    tracing::info!("{}", banner);

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::warn!("failed to listen for SIGTERM: {}", err);
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
    tracing::info!("shutting down");
}
