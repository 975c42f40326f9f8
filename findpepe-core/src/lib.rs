//! # findpepe core
//!
//! Selection engine for an image catalog organized by **category** (a
//! fixed enumeration) and **board** (an open-ended label).
//!
//! Two interchangeable backings implement the same contract:
//!
//! - [`TreeScanner`] walks `root/{category}/{source}/{board}/{image}` on
//!   demand, lazily, without an index.
//! - [`CatalogStore`] queries an `images` table through `sqlx`.
//!
//! [`SelectionEngine`] wraps whichever backing is active together with a
//! [`PathTranslator`] that turns storage paths into public URLs.

pub mod engine;
pub mod error;
pub mod paths;
pub mod selection;
pub mod store;
pub mod tree;
pub mod types;

pub use engine::{
    BoardLister, CatalogBackend, ImageSelector, SelectionEngine,
    dedup_first_seen, paginate,
};
pub use error::{CatalogError, Result};
pub use paths::{DEFAULT_PUBLIC_PREFIX, PathTranslator};
pub use selection::{DEFAULT_PAGE_SIZE, Page, PageRequest, Selection};
pub use store::{CatalogStore, MIGRATOR};
pub use tree::TreeScanner;
pub use types::{Board, Category, ImageRecord};
