use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// A category outside the fixed enumeration was requested.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// The page offset was negative or not an integer.
    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Backing unavailable: {0}")]
    BackingUnavailable(String),

    /// A backing produced a path outside the storage root.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl CatalogError {
    /// Errors caused by the request itself rather than by the backing.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CatalogError::InvalidFilter(_) | CatalogError::InvalidPagination(_)
        )
    }

    /// The bare message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            CatalogError::InvalidFilter(msg)
            | CatalogError::InvalidPagination(msg)
            | CatalogError::BackingUnavailable(msg)
            | CatalogError::InvalidPath(msg) => msg,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::BackingUnavailable(format!("filesystem error: {err}"))
    }
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::BackingUnavailable(format!("database error: {err}"))
    }
}

impl From<sqlx::migrate::MigrateError> for CatalogError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        CatalogError::BackingUnavailable(format!("migration failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
