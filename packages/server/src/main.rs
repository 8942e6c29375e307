use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::jobs::runner::JobRunner;
use server::jobs::{JobClient, default_registry};
use server::state::AppState;
use server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    seed::seed_roles(&db).await.context("Failed to seed roles")?;
    seed::seed_admin(&db, &config.auth)
        .await
        .context("Failed to seed administrator")?;
    seed::ensure_indexes(&db)
        .await
        .context("Failed to create indexes")?;

    let shutdown = CancellationToken::new();

    let runner = if config.jobs.enabled {
        let runner = JobRunner::new(db.clone(), default_registry(), config.jobs.clone());
        Some(tokio::spawn(runner.run(shutdown.child_token())))
    } else {
        info!("Job runner disabled");
        None
    };

    let state = AppState {
        db,
        jobs: JobClient::new(&config.jobs),
        config: config.clone(),
    };
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .into_future();
    let grace = Duration::from_secs(config.server.shutdown_grace_secs);

    tokio::select! {
        result = server => result.context("Server error")?,
        _ = async {
            shutdown.cancelled().await;
            tokio::time::sleep(grace).await;
        } => warn!("HTTP shutdown grace period elapsed, dropping open connections"),
    }

    if let Some(runner) = runner {
        if let Err(e) = runner.await {
            warn!(error = %e, "Job runner task failed");
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM and cancels `shutdown`.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
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

    info!("Shutdown signal received");
    shutdown.cancel();
}
