//! Catalog vocabulary: the fixed category set, open-ended boards and the
//! read-only image records the backings produce.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Top-level partition of the corpus. The set is closed; anything else
/// coming from outside is rejected with [`CatalogError::InvalidFilter`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
pub enum Category {
    #[serde(rename = "maybe")]
    Maybe,
    #[serde(rename = "non-pepe")]
    NonPepe,
    #[serde(rename = "pepe")]
    Pepe,
}

impl Category {
    /// Every category, in enumeration order.
    pub const ALL: [Category; 3] =
        [Category::Maybe, Category::NonPepe, Category::Pepe];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Maybe => "maybe",
            Category::NonPepe => "non-pepe",
            Category::Pepe => "pepe",
        }
    }

    /// Client-facing description of the accepted values.
    pub fn expected_values() -> String {
        let names: Vec<&str> =
            Self::ALL.iter().map(|category| category.as_str()).collect();
        format!("Category should be one of: [{}]", names.join(", "))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CatalogError;

    fn from_str(raw: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == raw)
            .ok_or_else(|| CatalogError::InvalidFilter(Self::expected_values()))
    }
}

/// Finer-grained label inside a category. Compared literally and
/// case-sensitively.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Board(String);

impl Board {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the name could be a directory entry: exactly one normal
    /// path component.
    pub fn is_path_component(&self) -> bool {
        let mut components = Path::new(&self.0).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(name)), None) if name == self.0.as_str()
        )
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Board {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Board {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Board {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// One discoverable image. `path` is storage-internal and unique.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub category: Category,
    pub board: Board,
    /// Classifier score, only known to the catalog table.
    pub classification: Option<f64>,
    /// Where the image was scraped from, only known to the catalog table.
    pub href: Option<String>,
}

impl ImageRecord {
    pub fn new(path: PathBuf, category: Category, board: Board) -> Self {
        Self {
            path,
            category,
            board,
            classification: None,
            href: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_its_tag() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn unknown_category_is_rejected_with_valid_set() {
        let err = "xyz".parse::<Category>().unwrap_err();
        match err {
            CatalogError::InvalidFilter(msg) => {
                assert_eq!(
                    msg,
                    "Category should be one of: [maybe, non-pepe, pepe]"
                );
            }
            other => panic!("expected InvalidFilter, got {other:?}"),
        }
    }

    #[test]
    fn category_parsing_is_case_sensitive() {
        assert!("Pepe".parse::<Category>().is_err());
        assert!("NON-PEPE".parse::<Category>().is_err());
    }

    #[test]
    fn category_displays_as_tag() {
        assert_eq!(Category::NonPepe.to_string(), "non-pepe");
        assert_eq!(Category::ALL.len(), 3);
    }

    #[test]
    fn board_path_component_detection() {
        assert!(Board::new("pol").is_path_component());
        assert!(Board::new("b").is_path_component());
        assert!(!Board::new("").is_path_component());
        assert!(!Board::new("..").is_path_component());
        assert!(!Board::new(".").is_path_component());
        assert!(!Board::new("a/b").is_path_component());
        assert!(!Board::new("/etc").is_path_component());
        assert!(!Board::new("pol/").is_path_component());
    }
}
