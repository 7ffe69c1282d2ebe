use anyhow::Result;
use recipebox::{App, config::Config};

pub async fn serve(config: Config) -> Result<()> {
    tracing::info!("Starting recipebox...");

    let app = App::start(&config).await?;

    tracing::info!("recipebox running, waiting for shutdown signal");

    shutdown_signal().await;

    app.shutdown().await;

    Ok(())
}

pub async fn migrate(config: Config) -> Result<()> {
    let pool = recipebox::create_pool(&config.database.url, 1).await?;
    recipebox::db::migrate(&pool).await?;
    pool.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Starting graceful shutdown...");
}
