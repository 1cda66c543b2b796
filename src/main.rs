use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod middleware;
mod routes;
mod services;

use config::Config;
use services::init;
use services::notifier::{Notifier, TelegramNotifier};

pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: Config,
    pub notifier: Arc<dyn Notifier>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "event_signup=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration (Config::from_env loads .env)
    let config = Config::from_env()?;

    tracing::info!("Starting Event Signup Service");

    // Initialize database
    let pool = init::init_db(&config).await?;

    // Initialize the Telegram notifier; the token is required.
    let token = config
        .telegram
        .bot_token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("TELEGRAM_BOT_TOKEN is required"))?;
    let notifier: Arc<dyn Notifier> = Arc::new(
        TelegramNotifier::new(
            token,
            Duration::from_secs(config.telegram.send_timeout_seconds),
        )
        .await?,
    );

    let app_state = Arc::new(AppState {
        db: pool.clone(),
        config: config.clone(),
        notifier: notifier.clone(),
    });

    // Create shutdown notifier for background workers
    let (shutdown_tx, _shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);

    // Spawn the reminder delivery worker (returns a JoinHandle so we can
    // await task shutdown)
    let worker_handle =
        init::spawn_reminder_worker(pool, notifier, &config, shutdown_tx.clone());

    // Build router
    let app = routes::app(app_state.clone());

    // Start server
    let host = config.server.host.clone();
    let port = config.server.port;
    let addr = format!("{}:{}", host, port);

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let server_fut = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );

    let shutdown_tx_clone = shutdown_tx.clone();

    let signal_fut = async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut term = match tokio::signal::unix::signal(
                tokio::signal::unix::SignalKind::terminate(),
            ) {
                Ok(term) => term,
                Err(e) => {
                    tracing::error!("Failed to bind SIGTERM: {}", e);
                    let _ = ctrl_c.await;
                    let _ = shutdown_tx_clone.send(());
                    return;
                }
            };
            tokio::select! {
                _ = ctrl_c => {},
                _ = term.recv() => {},
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }

        tracing::info!("Shutdown signal received, notifying background workers");
        let _ = shutdown_tx_clone.send(());
    };

    tokio::select! {
        res = server_fut => {
            if let Err(e) = res {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = signal_fut => {
            tracing::info!("Signal handler completed; server future dropped to stop accepting new connections");
        }
    }

    // Give the reminder worker some time to finish the current pass.
    let shutdown_wait = Duration::from_secs(15);
    tracing::info!(
        "Waiting up to {}s for the reminder worker to exit",
        shutdown_wait.as_secs()
    );
    let _ = tokio::time::timeout(shutdown_wait, worker_handle).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
