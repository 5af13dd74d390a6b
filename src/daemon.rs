use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::api;
use crate::config::Config;
use crate::playlist::OrderedPlaylist;
use crate::store::FileStore;

/// Shared by every request handler. The playlist is the single
/// process-wide instance; handlers hold the lock for a whole operation.
#[derive(Clone)]
pub struct AppState {
    pub playlist: Arc<Mutex<OrderedPlaylist>>,
    pub store: Arc<FileStore>,
}

pub struct Daemon {
    config: Config,
    state: AppState,
}

impl Daemon {
    /// Prepares the upload dir and rebuilds the playlist from its listing.
    pub fn new(config: Config) -> Result<Self> {
        let store = FileStore::from_config(&config);
        store.ensure_dir()?;

        let playlist = load_existing_songs(&store)?;
        if playlist.is_empty() {
            info!("No songs found in {}", store.root().display());
        } else {
            info!(
                "Loaded {} songs from {}: {:?}",
                playlist.len(),
                store.root().display(),
                playlist.all_keys()
            );
        }

        Ok(Self {
            config,
            state: AppState {
                playlist: Arc::new(Mutex::new(playlist)),
                store: Arc::new(store),
            },
        })
    }

    pub fn router(&self) -> Router {
        api::create_router(self.state.clone(), self.config.max_upload_bytes)
    }

    pub async fn run(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.config.addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.config.addr))?;
        info!("Listening on http://{}", self.config.addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        info!("Server stopped");
        Ok(())
    }
}

/// Replays the stored files through `append` in sorted order.
fn load_existing_songs(store: &FileStore) -> Result<OrderedPlaylist> {
    Ok(store.scan()?.into_iter().collect())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

pub async fn start(config: Config) -> Result<()> {
    let daemon = Daemon::new(config)?;
    daemon.run().await
}
