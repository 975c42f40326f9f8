use std::num::NonZeroU32;

use thiserror::Error;

use super::models::{BackendKind, Config};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("page size must be a positive integer, got '{value}'")]
    InvalidPageSize { value: String },
    #[error("public prefix '{prefix}' {reason}")]
    InvalidPublicPrefix { prefix: String, reason: &'static str },
    #[error("unknown catalog backend '{value}'; expected tree or store")]
    UnknownBackend { value: String },
    #[error("invalid value '{value}' for {field}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("the store backend requires DATABASE_URL")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn page_size(raw: &str) -> Result<NonZeroU32, ConfigValidationError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(|| ConfigValidationError::InvalidPageSize {
            value: raw.to_string(),
        })
}

/// The prefix is mounted as a nested route, so it must be absolute and
/// cannot be the router root.
pub fn public_prefix(raw: &str) -> Result<String, ConfigValidationError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !raw.trim().starts_with('/') {
        return Err(ConfigValidationError::InvalidPublicPrefix {
            prefix: raw.to_string(),
            reason: "must start with '/'",
        });
    }
    if trimmed.is_empty() {
        return Err(ConfigValidationError::InvalidPublicPrefix {
            prefix: raw.to_string(),
            reason: "must not be the root path",
        });
    }
    Ok(trimmed.to_string())
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigValidationError> {
    let mut warnings = ConfigWarnings::default();

    match config.catalog.backend {
        BackendKind::Store => {
            if config.database.url.is_none() {
                return Err(ConfigValidationError::MissingDatabaseUrl);
            }
        }
        BackendKind::Tree => {
            if config.database.url.is_some() {
                warnings.push_with_hint(
                    "DATABASE_URL is set but the tree backend is active",
                    "Set CATALOG_BACKEND=store to serve from the catalog table",
                );
            }
        }
    }

    if !config.catalog.storage_root.is_dir() {
        warnings.push_with_hint(
            format!(
                "storage root {} does not exist or is not a directory",
                config.catalog.storage_root.display()
            ),
            "Set STORAGE_ROOT to the directory holding {category}/{source}/{board} folders",
        );
    }

    if config.dev_mode {
        warnings.push("DEV_MODE enabled; CORS is permissive");
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn page_size_rejects_zero_and_garbage() {
        assert_eq!(page_size(" 10 ").unwrap().get(), 10);
        assert!(matches!(
            page_size("0"),
            Err(ConfigValidationError::InvalidPageSize { .. })
        ));
        assert!(page_size("-3").is_err());
        assert!(page_size("ten").is_err());
    }

    #[test]
    fn public_prefix_is_normalized() {
        assert_eq!(public_prefix("/images/").unwrap(), "/images");
        assert_eq!(public_prefix("/static/img").unwrap(), "/static/img");
        assert!(public_prefix("images").is_err());
        assert!(public_prefix("/").is_err());
        assert!(public_prefix("//").is_err());
    }

    #[test]
    fn store_backend_requires_database_url() {
        let mut config = Config::default();
        config.catalog.backend = BackendKind::Store;

        assert_eq!(
            apply_guard_rails(&config).unwrap_err(),
            ConfigValidationError::MissingDatabaseUrl
        );

        config.database.url = Some("sqlite://catalog.db".into());
        assert!(apply_guard_rails(&config).is_ok());
    }

    #[test]
    fn missing_storage_root_is_a_warning() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.catalog.storage_root = temp_dir.path().join("absent");

        let warnings = apply_guard_rails(&config).unwrap();
        assert_eq!(warnings.items.len(), 1);
        assert!(warnings.items[0].hint.is_some());

        config.catalog.storage_root = temp_dir.path().to_path_buf();
        assert!(apply_guard_rails(&config).unwrap().is_empty());
    }
}
