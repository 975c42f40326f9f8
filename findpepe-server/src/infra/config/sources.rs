use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::models::BackendKind;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub catalog: FileCatalogConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCatalogConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_migrations: Option<bool>,
}

/// Environment-derived configuration values. Numeric and enum values are
/// kept raw so the loader can report malformed input instead of dropping it.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<String>,
    pub catalog_backend: Option<String>,
    pub storage_root: Option<PathBuf>,
    pub public_prefix: Option<String>,
    pub page_size: Option<String>,
    pub extensions: Option<Vec<String>>,
    pub database_url: Option<String>,
    pub database_max_connections: Option<String>,
    pub database_run_migrations: Option<bool>,
    pub dev_mode: Option<bool>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        let mut env_config = Self::default();

        env_config.config_path =
            non_empty_var("FINDPEPE_CONFIG").map(PathBuf::from);
        env_config.server_host = non_empty_var("SERVER_HOST");
        env_config.server_port =
            non_empty_var("SERVER_PORT").or_else(|| non_empty_var("PORT"));
        env_config.catalog_backend = non_empty_var("CATALOG_BACKEND");
        env_config.storage_root = non_empty_var("STORAGE_ROOT")
            .or_else(|| non_empty_var("DATA_DIR"))
            .map(PathBuf::from);
        env_config.public_prefix = non_empty_var("PUBLIC_PREFIX");
        env_config.page_size = non_empty_var("PAGE_SIZE");
        env_config.extensions = parse_csv_var("IMAGE_EXTENSIONS");
        env_config.database_url = non_empty_var("DATABASE_URL");
        env_config.database_max_connections =
            non_empty_var("DATABASE_MAX_CONNECTIONS");
        env_config.database_run_migrations =
            parse_bool_var("DATABASE_RUN_MIGRATIONS");
        env_config.dev_mode = parse_bool_var("DEV_MODE");

        env_config
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_csv_var(name: &str) -> Option<Vec<String>> {
    std::env::var(name).ok().map(|raw| split_csv(&raw))
}

pub(crate) fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|part| {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

fn parse_bool_var(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|raw| parse_bool(&raw))
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
