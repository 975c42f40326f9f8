use std::path::{Component, Path, PathBuf};

use crate::error::{CatalogError, Result};

pub const DEFAULT_PUBLIC_PREFIX: &str = "/images";

/// Rewrites storage-internal paths into client-facing URLs by swapping the
/// storage root for the public serving prefix.
#[derive(Debug, Clone)]
pub struct PathTranslator {
    storage_root: PathBuf,
    public_prefix: String,
}

impl PathTranslator {
    pub fn new(
        storage_root: impl Into<PathBuf>,
        public_prefix: impl Into<String>,
    ) -> Self {
        let public_prefix = public_prefix.into();
        let public_prefix = public_prefix.trim_end_matches('/').to_string();
        Self {
            storage_root: storage_root.into(),
            public_prefix,
        }
    }

    /// Relative paths that do not start with the root are taken to be
    /// relative to it already (the catalog table may store them that way).
    pub fn to_public_path(&self, internal: &Path) -> Result<String> {
        let relative = match internal.strip_prefix(&self.storage_root) {
            Ok(relative) => relative,
            Err(_) if internal.is_relative() => internal,
            Err(_) => {
                return Err(CatalogError::InvalidPath(format!(
                    "{} is not under storage root {}",
                    internal.display(),
                    self.storage_root.display()
                )));
            }
        };

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => {
                    let segment = segment.to_str().ok_or_else(|| {
                        CatalogError::InvalidPath(format!(
                            "{} is not valid UTF-8",
                            internal.display()
                        ))
                    })?;
                    segments.push(segment);
                }
                Component::CurDir => {}
                _ => {
                    return Err(CatalogError::InvalidPath(format!(
                        "{} escapes storage root {}",
                        internal.display(),
                        self.storage_root.display()
                    )));
                }
            }
        }

        if segments.is_empty() {
            return Err(CatalogError::InvalidPath(format!(
                "{} names the storage root itself",
                internal.display()
            )));
        }

        Ok(format!("{}/{}", self.public_prefix, segments.join("/")))
    }
}
