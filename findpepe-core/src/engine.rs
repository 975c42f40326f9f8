//! Backing-agnostic selection contract.
//!
//! Both backings implement [`BoardLister`] and [`ImageSelector`]; the
//! [`SelectionEngine`] holds whichever one is active and pairs it with the
//! [`PathTranslator`] so callers can get client-safe references directly.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::error::Result;
use crate::paths::PathTranslator;
use crate::selection::{Page, PageRequest, Selection};
use crate::types::{Board, Category, ImageRecord};

#[async_trait]
pub trait BoardLister: Send + Sync {
    /// Distinct boards for one category, or across every category when
    /// `category` is `None`. Each board appears at most once.
    async fn list_boards(&self, category: Option<Category>) -> Result<Vec<Board>>;
}

#[async_trait]
pub trait ImageSelector: Send + Sync {
    /// One page of the records matching `selection`, in a stable order.
    async fn select_images(&self, selection: &Selection)
    -> Result<Page<ImageRecord>>;
}

/// A complete backing: board discovery plus image selection.
pub trait CatalogBackend: BoardLister + ImageSelector + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Deduplicate while keeping the first occurrence of each board.
pub fn dedup_first_seen<I>(boards: I) -> Vec<Board>
where
    I: IntoIterator<Item = Board>,
{
    let mut seen = HashSet::new();
    boards
        .into_iter()
        .filter(|board| seen.insert(board.clone()))
        .collect()
}

/// Pull one page out of a lazy enumeration. Stops polling as soon as the
/// window is filled; errors anywhere before that point are surfaced.
pub async fn paginate<T, S>(stream: S, request: PageRequest) -> Result<Page<T>>
where
    S: Stream<Item = Result<T>>,
{
    let window = request.window();
    let mut stream = std::pin::pin!(stream);
    let mut items = Vec::with_capacity(request.size() as usize);
    let mut position: u64 = 0;

    while position < window.end {
        let Some(item) = stream.next().await else {
            break;
        };
        let item = item?;
        if position >= window.start {
            items.push(item);
        }
        position += 1;
    }

    Ok(Page::new(items, request))
}

#[derive(Clone)]
pub struct SelectionEngine {
    backend: Arc<dyn CatalogBackend>,
    translator: PathTranslator,
}

impl fmt::Debug for SelectionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionEngine")
            .field("backend", &self.backend.name())
            .field("translator", &self.translator)
            .finish()
    }
}

impl SelectionEngine {
    pub fn new(
        backend: Arc<dyn CatalogBackend>,
        translator: PathTranslator,
    ) -> Self {
        Self {
            backend,
            translator,
        }
    }

    pub fn backend(&self) -> &dyn CatalogBackend {
        self.backend.as_ref()
    }

    pub async fn list_boards(
        &self,
        category: Option<Category>,
    ) -> Result<Vec<Board>> {
        let boards = self.backend.list_boards(category).await?;
        debug!(
            backend = self.backend.name(),
            category = category.map(|c| c.as_str()),
            count = boards.len(),
            "listed boards"
        );
        Ok(boards)
    }

    pub async fn select_images(
        &self,
        selection: &Selection,
    ) -> Result<Page<ImageRecord>> {
        let page = self.backend.select_images(selection).await?;
        debug!(
            backend = self.backend.name(),
            category = selection.category().map(|c| c.as_str()),
            board = selection.board().map(Board::as_str),
            offset = selection.page().index(),
            count = page.len(),
            "selected images"
        );
        Ok(page)
    }

    /// Like [`select_images`](Self::select_images) but with every record
    /// rewritten to its public path.
    pub async fn select_public_paths(
        &self,
        selection: &Selection,
    ) -> Result<Page<String>> {
        let page = self.select_images(selection).await?;
        page.try_map(|record| self.translator.to_public_path(&record.path))
    }
}
