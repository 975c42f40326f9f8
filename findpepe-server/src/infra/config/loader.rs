use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use findpepe_core::{DEFAULT_PAGE_SIZE, DEFAULT_PUBLIC_PREFIX};

use super::{
    models::{
        BackendKind, CatalogConfig, Config, ConfigMetadata, DEFAULT_HOST,
        DEFAULT_MAX_CONNECTIONS, DEFAULT_PORT, DEFAULT_STORAGE_ROOT,
        DatabaseConfig, ServerConfig,
    },
    sources::{EnvConfig, FileConfig},
    validation::{self, ConfigValidationError, ConfigWarnings},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("findpepe.toml"),
        PathBuf::from("config/findpepe.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
struct ConfigLoaderOptions {
    config_path: Option<PathBuf>,
    env_file: Option<PathBuf>,
}

/// Resolves [`Config`] from `.env`, the process environment and an optional
/// TOML file. Environment values take precedence over the file.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let env_config = EnvConfig::gather();
        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let (config, warnings) = compose_config(
            file_config,
            env_config,
            config_path,
            env_file_loaded,
        )?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env_config.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(found) => found.clone(),
                None => return Ok((None, None)),
            },
        };

        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
    toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source: err,
    })
}

/// Merge file and environment layers into a validated [`Config`].
pub fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
    env_file_loaded: bool,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if file_config.is_none() {
        warnings.push_with_hint(
            "No findpepe.toml detected; using environment variables and defaults",
            "Create findpepe.toml or set FINDPEPE_CONFIG to point at one",
        );
    }

    let FileConfig {
        server: file_server,
        catalog: file_catalog,
        database: file_database,
        dev_mode: file_dev_mode,
    } = file_config.unwrap_or_default();

    let port = match env.server_port {
        Some(raw) => raw.parse::<u16>().map_err(|_| {
            ConfigValidationError::InvalidNumber {
                field: "SERVER_PORT",
                value: raw.clone(),
            }
        })?,
        None => file_server.port.unwrap_or(DEFAULT_PORT),
    };
    let server = ServerConfig {
        host: env
            .server_host
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port,
    };

    let backend = match env.catalog_backend {
        Some(raw) => raw.parse::<BackendKind>().map_err(|value| {
            ConfigValidationError::UnknownBackend { value }
        })?,
        None => file_catalog.backend.unwrap_or_default(),
    };

    let page_size = match (env.page_size, file_catalog.page_size) {
        (Some(raw), _) => validation::page_size(&raw)?,
        (None, Some(size)) => validation::page_size(&size.to_string())?,
        (None, None) => DEFAULT_PAGE_SIZE,
    };

    let public_prefix = validation::public_prefix(
        env.public_prefix
            .as_deref()
            .or(file_catalog.public_prefix.as_deref())
            .unwrap_or(DEFAULT_PUBLIC_PREFIX),
    )?;

    let extensions = env
        .extensions
        .or(file_catalog.extensions)
        .unwrap_or_default()
        .into_iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect();

    let catalog = CatalogConfig {
        backend,
        storage_root: env
            .storage_root
            .or(file_catalog.storage_root)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_ROOT)),
        public_prefix,
        page_size,
        extensions,
    };

    let max_connections = match env.database_max_connections {
        Some(raw) => raw.parse::<u32>().ok().filter(|n| *n > 0).ok_or(
            ConfigValidationError::InvalidNumber {
                field: "DATABASE_MAX_CONNECTIONS",
                value: raw.clone(),
            },
        )?,
        None => file_database
            .max_connections
            .unwrap_or(DEFAULT_MAX_CONNECTIONS),
    };
    let database = DatabaseConfig {
        url: env
            .database_url
            .or(file_database.url)
            .filter(|url| !url.trim().is_empty()),
        max_connections,
        run_migrations: env
            .database_run_migrations
            .or(file_database.run_migrations)
            .unwrap_or(false),
    };

    let config = Config {
        server,
        catalog,
        database,
        dev_mode: env.dev_mode.or(file_dev_mode).unwrap_or(false),
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded,
        },
    };

    warnings.extend(validation::apply_guard_rails(&config)?);
    Ok((config, warnings))
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Validation(#[from] ConfigValidationError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
