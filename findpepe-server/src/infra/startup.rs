use std::sync::Arc;

use anyhow::{Context, Result};
use findpepe_core::{CatalogBackend, CatalogStore, SelectionEngine, TreeScanner};
use tracing::{info, warn};

use crate::infra::{
    app_state::AppState,
    config::{BackendKind, Config},
};

/// Everything `serve` needs, plus the pool to close on shutdown.
#[derive(Debug)]
pub struct ResourceBootstrap {
    pub state: AppState,
    pub store: Option<CatalogStore>,
}

pub async fn connect_store(config: &Config) -> Result<CatalogStore> {
    let url = config
        .database
        .url
        .as_deref()
        .context("DATABASE_URL must be set to use the catalog store")?;

    CatalogStore::connect(url, config.database.max_connections)
        .await
        .context("failed to connect to catalog database")
}

/// Build the active backing and wrap it in a [`SelectionEngine`].
pub async fn wire_app_resources(
    config: Arc<Config>,
) -> Result<ResourceBootstrap> {
    let (backend, store): (Arc<dyn CatalogBackend>, Option<CatalogStore>) =
        match config.catalog.backend {
            BackendKind::Tree => {
                let scanner = TreeScanner::new(&config.catalog.storage_root)
                    .with_extensions(&config.catalog.extensions);
                info!(
                    root = %config.catalog.storage_root.display(),
                    extensions = ?config.catalog.extensions,
                    "serving catalog from directory tree"
                );
                (Arc::new(scanner), None)
            }
            BackendKind::Store => {
                let store = connect_store(&config).await?;
                if config.database.run_migrations {
                    store
                        .run_migrations()
                        .await
                        .context("catalog migration failed")?;
                } else {
                    info!("skipping catalog migrations");
                }
                (Arc::new(store.clone()), Some(store))
            }
        };

    let engine = SelectionEngine::new(backend, config.path_translator());
    let state = AppState::new(engine, config);

    Ok(ResourceBootstrap { state, store })
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
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

    info!("shutdown signal received");
}
