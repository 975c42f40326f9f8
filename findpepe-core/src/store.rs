//! Relational backing over the `images` table.
//!
//! Connections go through `sqlx::Any` so the same store serves PostgreSQL
//! (the scraper's database) and SQLite. Placeholders are always written as
//! `$N`, which both drivers accept. Only rows whose category belongs to the
//! fixed enumeration are part of the catalog.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::any::AnyPoolOptions;
use sqlx::migrate::Migrator;
use sqlx::{Any, AnyPool, FromRow};
use tracing::{debug, info};

use crate::engine::{BoardLister, CatalogBackend, ImageSelector};
use crate::error::{CatalogError, Result};
use crate::selection::{Page, Selection};
use crate::types::{Board, Category, ImageRecord};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, FromRow)]
struct ImageRow {
    file_path: String,
    category: String,
    board: String,
    classification: Option<f64>,
    href: Option<String>,
}

impl TryFrom<ImageRow> for ImageRecord {
    type Error = CatalogError;

    fn try_from(row: ImageRow) -> Result<Self> {
        let category = row.category.parse::<Category>().map_err(|_| {
            CatalogError::BackingUnavailable(format!(
                "row for {} carries unknown category {}",
                row.file_path, row.category
            ))
        })?;

        Ok(ImageRecord {
            path: PathBuf::from(row.file_path),
            category,
            board: Board::from(row.board),
            classification: row.classification,
            href: row.href,
        })
    }
}

/// `WHERE` body plus its bind values, numbered from `$1`.
#[derive(Debug, PartialEq, Eq)]
struct SelectionFilter {
    clause: String,
    binds: Vec<String>,
}

impl SelectionFilter {
    /// An empty `categories` slice means every known category; an empty
    /// `boards` slice means any board.
    fn new(categories: &[Category], boards: &[Board]) -> Self {
        let categories = if categories.is_empty() {
            &Category::ALL[..]
        } else {
            categories
        };

        let mut filter = Self {
            clause: String::from("category IN ("),
            binds: Vec::new(),
        };
        filter.push_list(categories.iter().map(|c| c.as_str().to_string()));
        filter.clause.push(')');

        if !boards.is_empty() {
            filter.clause.push_str(" AND board IN (");
            filter.push_list(boards.iter().map(|b| b.as_str().to_string()));
            filter.clause.push(')');
        }

        filter
    }

    fn push_list(&mut self, values: impl Iterator<Item = String>) {
        for (i, value) in values.enumerate() {
            if i > 0 {
                self.clause.push_str(", ");
            }
            self.binds.push(value);
            self.clause.push_str(&format!("${}", self.binds.len()));
        }
    }

    fn next_placeholder(&self, skip: usize) -> String {
        format!("${}", self.binds.len() + skip + 1)
    }
}

#[derive(Debug, Clone)]
pub struct CatalogStore {
    pool: AnyPool,
}

impl CatalogStore {
    /// Connect to `url` (`postgres://…` or `sqlite://…`).
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        sqlx::any::install_default_drivers();
        info!("Connecting to catalog database");

        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| {
                CatalogError::BackingUnavailable(format!(
                    "Failed to connect to catalog database: {e}"
                ))
            })?;

        info!("Successfully connected to catalog database");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Create the `images` table and its indexes if they are missing.
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running catalog migrations");
        MIGRATOR.run(&self.pool).await?;
        info!("Catalog migrations completed successfully");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn unique_boards(&self) -> Result<Vec<Board>> {
        self.distinct_boards(&[]).await
    }

    pub async fn unique_boards_by_category(
        &self,
        category: Category,
    ) -> Result<Vec<Board>> {
        self.distinct_boards(&[category]).await
    }

    async fn distinct_boards(&self, categories: &[Category]) -> Result<Vec<Board>> {
        let filter = SelectionFilter::new(categories, &[]);
        let sql = format!(
            "SELECT DISTINCT board FROM images WHERE {} ORDER BY board",
            filter.clause
        );

        let mut query = sqlx::query_scalar::<Any, String>(&sql);
        for value in &filter.binds {
            query = query.bind(value.clone());
        }

        let boards = query.fetch_all(&self.pool).await?;
        debug!(count = boards.len(), "fetched distinct boards");
        Ok(boards.into_iter().map(Board::from).collect())
    }

    /// File paths matching the selection, ordered by row id.
    pub async fn image_paths_by_selection(
        &self,
        categories: &[Category],
        boards: &[Board],
        offset: u64,
        limit: u32,
    ) -> Result<Vec<PathBuf>> {
        let filter = SelectionFilter::new(categories, boards);
        let sql = format!(
            "SELECT file_path FROM images WHERE {} ORDER BY id LIMIT {} OFFSET {}",
            filter.clause,
            filter.next_placeholder(0),
            filter.next_placeholder(1),
        );

        let mut query = sqlx::query_scalar::<Any, String>(&sql);
        for value in &filter.binds {
            query = query.bind(value.clone());
        }

        let paths = query
            .bind(i64::from(limit))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        Ok(paths.into_iter().map(PathBuf::from).collect())
    }

    /// Full records matching the selection, ordered by row id.
    pub async fn images_by_selection(
        &self,
        categories: &[Category],
        boards: &[Board],
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ImageRecord>> {
        let filter = SelectionFilter::new(categories, boards);
        let sql = format!(
            r#"
            SELECT file_path, category, board,
                   CAST(classification AS DOUBLE PRECISION) AS classification,
                   href
            FROM images
            WHERE {}
            ORDER BY id
            LIMIT {} OFFSET {}
            "#,
            filter.clause,
            filter.next_placeholder(0),
            filter.next_placeholder(1),
        );

        let mut query = sqlx::query_as::<Any, ImageRow>(&sql);
        for value in &filter.binds {
            query = query.bind(value.clone());
        }

        let rows = query
            .bind(i64::from(limit))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ImageRecord::try_from).collect()
    }
}

#[async_trait]
impl BoardLister for CatalogStore {
    async fn list_boards(&self, category: Option<Category>) -> Result<Vec<Board>> {
        match category {
            Some(category) => self.unique_boards_by_category(category).await,
            None => self.unique_boards().await,
        }
    }
}

#[async_trait]
impl ImageSelector for CatalogStore {
    async fn select_images(
        &self,
        selection: &Selection,
    ) -> Result<Page<ImageRecord>> {
        let page = selection.page();
        let categories: Vec<Category> = selection.category().into_iter().collect();
        let boards: Vec<Board> = selection.board().cloned().into_iter().collect();

        let records = self
            .images_by_selection(&categories, &boards, page.start(), page.size())
            .await?;
        Ok(Page::new(records, page))
    }
}

impl CatalogBackend for CatalogStore {
    fn name(&self) -> &'static str {
        "store"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_defaults_to_every_known_category() {
        let filter = SelectionFilter::new(&[], &[]);
        assert_eq!(filter.clause, "category IN ($1, $2, $3)");
        assert_eq!(filter.binds, vec!["maybe", "non-pepe", "pepe"]);
        assert_eq!(filter.next_placeholder(0), "$4");
    }

    #[test]
    fn filter_combines_category_and_board() {
        let filter =
            SelectionFilter::new(&[Category::Pepe], &[Board::from("pol")]);
        assert_eq!(filter.clause, "category IN ($1) AND board IN ($2)");
        assert_eq!(filter.binds, vec!["pepe", "pol"]);
        assert_eq!(filter.next_placeholder(1), "$4");
    }

    #[test]
    fn unknown_row_category_is_rejected() {
        let row = ImageRow {
            file_path: "x.png".into(),
            category: "unclassified".into(),
            board: "pol".into(),
            classification: None,
            href: None,
        };
        assert!(ImageRecord::try_from(row).is_err());
    }
}
