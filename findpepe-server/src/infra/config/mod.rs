pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader};
pub use models::{
    BackendKind, CatalogConfig, Config, ConfigMetadata, DatabaseConfig,
    ServerConfig,
};
pub use validation::{ConfigValidationError, ConfigWarning, ConfigWarnings};
