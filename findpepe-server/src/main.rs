//! # findpepe server
//!
//! Serves a classified image catalog over HTTP:
//!
//! - `GET /boards` and `GET /boards/{category}` list distinct boards
//! - `GET /?category=&board=&offset=` returns one page of public image paths
//! - `GET {public_prefix}/...` serves the image files themselves
//!
//! The catalog is either a directory tree walked on demand or the `images`
//! table populated by the scraper.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use findpepe_server::{
    create_app,
    infra::{
        config::{Config, ConfigLoad, ConfigLoader},
        startup::{
            ResourceBootstrap, connect_store, shutdown_signal,
            wire_app_resources,
        },
    },
};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "findpepe-server")]
#[command(about = "Browse a classified image catalog by category and board")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Path to a findpepe.toml configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a .env file loaded before reading the environment
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Create the images table and its indexes, then exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(command) = cli.command {
        match command {
            Command::Db(DbCommand::Migrate) => {
                run_db_migrate(&cli.serve).await?;
                return Ok(());
            }
        }
    }

    run_server(cli.serve).await
}

async fn run_db_migrate(args: &ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(args)?;
    let store = connect_store(&config).await?;
    store
        .run_migrations()
        .await
        .context("catalog migration failed")?;
    store.close().await;
    info!("Catalog migrations applied successfully");
    Ok(())
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Arc<Config>> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = args.config.clone() {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = args.env_file.clone() {
        loader = loader.with_env_file(path);
    }

    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "loaded configuration file");
    }

    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => {
                warn!(message = %warning.message, "configuration warning")
            }
        }
    }

    info!(
        catalog.backend = %config.catalog.backend,
        catalog.storage_root = %config.catalog.storage_root.display(),
        catalog.public_prefix = %config.catalog.public_prefix,
        catalog.page_size = config.catalog.page_size.get(),
        dev_mode = config.dev_mode,
        "catalog configuration in effect"
    );

    Ok(Arc::new(config))
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(&args)?;

    let ResourceBootstrap { state, store } =
        wire_app_resources(Arc::clone(&config)).await?;

    let router = create_app(state);
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    info!("Starting findpepe server on {}", address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(store) = store {
        store.close().await;
    }
    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_migrate_subcommand() {
        let cli = Cli::try_parse_from(["findpepe-server", "db", "migrate"])
            .unwrap();
        assert!(matches!(cli.command, Some(Command::Db(DbCommand::Migrate))));
    }

    #[test]
    fn cli_parses_serve_overrides() {
        let cli = Cli::try_parse_from([
            "findpepe-server",
            "--port",
            "8081",
            "--host",
            "127.0.0.1",
            "--config",
            "findpepe.toml",
        ])
        .unwrap();

        assert!(cli.command.is_none());
        assert_eq!(cli.serve.port, Some(8081));
        assert_eq!(cli.serve.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.serve.config, Some(PathBuf::from("findpepe.toml")));
    }
}
