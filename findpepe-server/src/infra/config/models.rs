use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;

use findpepe_core::{DEFAULT_PAGE_SIZE, DEFAULT_PUBLIC_PREFIX, PathTranslator};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_STORAGE_ROOT: &str = "public/image";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Which backing answers catalog queries.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Walk `storage_root` on every request.
    #[default]
    Tree,
    /// Query the `images` table.
    Store,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Tree => "tree",
            BackendKind::Store => "store",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tree" | "fs" | "filesystem" => Ok(BackendKind::Tree),
            "store" | "db" | "database" => Ok(BackendKind::Store),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub backend: BackendKind,
    pub storage_root: PathBuf,
    pub public_prefix: String,
    pub page_size: NonZeroU32,
    /// Lowercase extensions accepted by the tree backing; empty accepts all.
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub database: DatabaseConfig,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
            },
            catalog: CatalogConfig {
                backend: BackendKind::default(),
                storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
                public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
                page_size: DEFAULT_PAGE_SIZE,
                extensions: Vec::new(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: DEFAULT_MAX_CONNECTIONS,
                run_migrations: false,
            },
            dev_mode: false,
            metadata: ConfigMetadata::default(),
        }
    }
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn path_translator(&self) -> PathTranslator {
        PathTranslator::new(
            &self.catalog.storage_root,
            self.catalog.public_prefix.as_str(),
        )
    }
}
