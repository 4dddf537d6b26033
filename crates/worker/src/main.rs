//! Worker entry point
//!
//! Loads configuration, initializes tracing, prewarms the session
//! pipeline, builds the document index in the background, then serves
//! voice sessions for incoming rooms until shutdown.

mod state;

use std::sync::Arc;

use tokio::sync::mpsc;

use docvoice_agent::Room;
use docvoice_config::{load_settings, Settings};

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::from_filename(".env.local").ok();

    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("DOCVOICE_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        },
    };

    init_tracing(&settings);

    tracing::info!("Starting docvoice worker v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?settings.environment,
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    let state = Arc::new(AppState::new(settings));
    state.prewarm();

    // Build the index in the background; early sessions run ungrounded
    // and later ones pick up the retriever once the slot fills. An
    // unusable persistence directory is fatal.
    let index_warmup = {
        let state = state.clone();
        tokio::spawn(async move { state.initialize_index().await })
    };

    let (room_tx, room_rx) = mpsc::channel::<Room>(16);
    let accept_loop = tokio::spawn(serve_rooms(state, room_rx));

    tracing::info!("Worker ready, waiting for rooms");

    let fatal: Option<anyhow::Error> = tokio::select! {
        _ = shutdown_signal() => None,
        warmed = index_warmup => match warmed {
            Ok(Ok(_)) => {
                shutdown_signal().await;
                None
            },
            Ok(Err(e)) => Some(e.into()),
            Err(e) => Some(anyhow::anyhow!("Index warm-up task panicked: {e}")),
        },
    };

    // Closing the channel ends the accept loop; running sessions get a
    // room-closed event from their transport.
    drop(room_tx);
    let _ = accept_loop.await;

    match fatal {
        Some(e) => {
            tracing::error!(error = %e, "Aborting, index initialization failed");
            Err(e)
        },
        None => {
            tracing::info!("Worker shutdown complete");
            Ok(())
        },
    }
}

/// Spawn a voice session for every incoming room
async fn serve_rooms(state: Arc<AppState>, mut rooms: mpsc::Receiver<Room>) {
    while let Some(room) = rooms.recv().await {
        let session = match state.build_session() {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, room = room.name(), "Failed to build session");
                continue;
            },
        };

        tracing::info!(
            session_id = session.session_id(),
            room = room.name(),
            grounded = state.index_ready(),
            "Accepted room"
        );

        tokio::spawn(async move {
            if let Err(e) = session.run(room).await {
                tracing::error!(error = %e, "Session failed");
            }
        });
    }

    tracing::info!("Room accept loop stopped");
}

fn init_tracing(settings: &Settings) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| settings.observability.log_level.clone().into());

    let subscriber = tracing_subscriber::registry().with(env_filter);
    if settings.observability.log_json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
