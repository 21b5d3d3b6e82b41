mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use magus_api::auth::{AppState, AppStateInner};
use magus_api::chat::ChatResponder;
use magus_api::inference::InferenceClient;
use magus_api::router;
use magus_api::session::Sessions;
use magus_db::Database;

use crate::config::{Config, IN_MEMORY_DB};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "magus_server=debug,magus_api=debug,magus_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.uses_placeholder_secret() {
        warn!("MAGUS_AUTH_SECRET is unset or a placeholder; sessions are forgeable. Do not use in production.");
    }

    let db = if config.db_path.as_os_str() == IN_MEMORY_DB {
        warn!("Using an in-memory credential store; users vanish on restart");
        Database::open_in_memory()?
    } else {
        Database::open(&config.db_path)?
    };

    let responder = match config.inference.clone() {
        Some(inference) => ChatResponder::Hosted(InferenceClient::new(inference)?),
        None => ChatResponder::Stub,
    };
    info!("Chat responder: {}", responder.describe());

    let state: AppState = Arc::new(AppStateInner {
        db: Arc::new(db),
        sessions: Sessions::new(&config.auth_secret, config.production),
        responder,
    });

    let app = router::build(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Magus listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
