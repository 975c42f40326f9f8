//! Directory-tree backing.
//!
//! Layout: `root/{category}/{source}/{board}/{image}`. Nothing is indexed;
//! every call walks the tree again. Image enumeration is a lazy stream that
//! reads one directory at a time, so a small page only touches the
//! directories needed to fill it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_stream::try_stream;
use async_trait::async_trait;
use futures::Stream;
use tokio::fs;
use tracing::{debug, warn};

use crate::engine::{
    BoardLister, CatalogBackend, ImageSelector, dedup_first_seen, paginate,
};
use crate::error::{CatalogError, Result};
use crate::selection::{Page, Selection};
use crate::types::{Board, Category, ImageRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
}

#[derive(Debug, Clone)]
pub struct TreeScanner {
    root: PathBuf,
    /// Lowercase extensions without the dot. Empty accepts every file.
    extensions: Vec<String>,
}

impl TreeScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: Vec::new(),
        }
    }

    /// Restrict enumeration to files with one of these extensions.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    pub fn is_image_file(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    async fn ensure_root(&self) -> Result<()> {
        let metadata = fs::metadata(&self.root).await.map_err(|err| {
            CatalogError::BackingUnavailable(format!(
                "storage root {} is unreadable: {err}",
                self.root.display()
            ))
        })?;

        if !metadata.is_dir() {
            return Err(CatalogError::BackingUnavailable(format!(
                "storage root {} is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }

    /// Visible children of `dir` of the given kind, sorted by name. A
    /// missing directory has no children.
    async fn children(
        &self,
        dir: &Path,
        kind: EntryKind,
    ) -> Result<Vec<(String, PathBuf)>> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::NotFound | ErrorKind::NotADirectory
                ) =>
            {
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(CatalogError::BackingUnavailable(format!(
                    "failed to read {}: {err}",
                    dir.display()
                )));
            }
        };

        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Ok(name) = entry.file_name().into_string() else {
                warn!(path = %path.display(), "skipping non UTF-8 entry");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            let file_type = entry.file_type().await?;
            let (is_dir, is_file) = if file_type.is_symlink() {
                match fs::metadata(&path).await {
                    Ok(target) => (target.is_dir(), target.is_file()),
                    Err(err) => {
                        debug!(path = %path.display(), error = %err, "skipping dangling symlink");
                        continue;
                    }
                }
            } else {
                (file_type.is_dir(), file_type.is_file())
            };

            let keep = match kind {
                EntryKind::Directory => is_dir,
                EntryKind::File => is_file && self.is_image_file(&path),
            };
            if keep {
                children.push((name, path));
            }
        }

        children.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(children)
    }

    async fn source_dirs(&self, category: Category) -> Result<Vec<PathBuf>> {
        let category_root = self.root.join(category.as_str());
        Ok(self
            .children(&category_root, EntryKind::Directory)
            .await?
            .into_iter()
            .map(|(_, path)| path)
            .collect())
    }

    /// Board directory names under every source of `category`, concatenated
    /// in source order. Not deduplicated.
    pub async fn enumerate_boards(&self, category: Category) -> Result<Vec<Board>> {
        let mut boards = Vec::new();
        for source in self.source_dirs(category).await? {
            let names = self.children(&source, EntryKind::Directory).await?;
            boards.extend(names.into_iter().map(|(name, _)| Board::from(name)));
        }
        Ok(boards)
    }

    /// Images of one board across all sources of `category`. Sources that
    /// lack the board contribute nothing.
    pub fn enumerate_images(
        &self,
        category: Category,
        board: Board,
    ) -> impl Stream<Item = Result<ImageRecord>> + Send + '_ {
        self.walk(vec![category], Some(board))
    }

    /// Flatten category -> source -> board -> image. Images are never
    /// deduplicated; two files sharing a basename are distinct records.
    pub fn walk(
        &self,
        categories: Vec<Category>,
        board: Option<Board>,
    ) -> impl Stream<Item = Result<ImageRecord>> + Send + '_ {
        try_stream! {
            for category in categories {
                for source in self.source_dirs(category).await? {
                    let board_dirs: Vec<(Board, PathBuf)> = match &board {
                        Some(wanted)
                            if wanted.is_path_component()
                                && !wanted.as_str().starts_with('.') =>
                        {
                            vec![(wanted.clone(), source.join(wanted.as_str()))]
                        }
                        Some(_) => Vec::new(),
                        None => self
                            .children(&source, EntryKind::Directory)
                            .await?
                            .into_iter()
                            .map(|(name, path)| (Board::from(name), path))
                            .collect(),
                    };

                    for (board_name, dir) in board_dirs {
                        for (_, path) in self.children(&dir, EntryKind::File).await? {
                            yield ImageRecord::new(path, category, board_name.clone());
                        }
                    }
                }
            }
        }
    }
}

#[async_trait]
impl BoardLister for TreeScanner {
    async fn list_boards(&self, category: Option<Category>) -> Result<Vec<Board>> {
        self.ensure_root().await?;

        let categories = match category {
            Some(category) => vec![category],
            None => Category::ALL.to_vec(),
        };

        let mut observed = Vec::new();
        for category in categories {
            observed.extend(self.enumerate_boards(category).await?);
        }
        Ok(dedup_first_seen(observed))
    }
}

#[async_trait]
impl ImageSelector for TreeScanner {
    async fn select_images(
        &self,
        selection: &Selection,
    ) -> Result<Page<ImageRecord>> {
        self.ensure_root().await?;
        let records =
            self.walk(selection.categories(), selection.board().cloned());
        paginate(records, selection.page()).await
    }
}

impl CatalogBackend for TreeScanner {
    fn name(&self) -> &'static str {
        "tree"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std_fs::create_dir_all(path.parent().unwrap()).unwrap();
        std_fs::write(path, b"img").unwrap();
    }

    fn fixture() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "pepe/4chan/pol/1.png");
        touch(root, "pepe/4chan/pol/2.png");
        touch(root, "pepe/4chan/b/1.png");
        touch(root, "pepe/archive/pol/3.jpg");
        touch(root, "pepe/archive/g/notes.txt");
        touch(root, "pepe/archive/g/.hidden.png");
        std_fs::create_dir_all(root.join("pepe/archive/.cache")).unwrap();
        touch(root, "maybe/4chan/pol/9.gif");
        temp_dir
    }

    #[tokio::test]
    async fn enumerate_boards_concatenates_sources() {
        let temp_dir = fixture();
        let scanner = TreeScanner::new(temp_dir.path());

        let boards = scanner.enumerate_boards(Category::Pepe).await.unwrap();

        assert_eq!(boards, ["b", "pol", "g", "pol"].map(Board::from).to_vec());
    }

    #[tokio::test]
    async fn missing_category_has_no_boards() {
        let temp_dir = fixture();
        let scanner = TreeScanner::new(temp_dir.path());

        let boards = scanner.enumerate_boards(Category::NonPepe).await.unwrap();

        assert!(boards.is_empty());
    }

    #[tokio::test]
    async fn enumerate_images_skips_sources_without_board() {
        let temp_dir = fixture();
        let scanner = TreeScanner::new(temp_dir.path());

        let records: Vec<ImageRecord> = scanner
            .enumerate_images(Category::Pepe, Board::from("b"))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, temp_dir.path().join("pepe/4chan/b/1.png"));
    }

    #[tokio::test]
    async fn walk_order_is_category_source_board_image() {
        let temp_dir = fixture();
        let scanner = TreeScanner::new(temp_dir.path());
        let root = temp_dir.path();

        let paths: Vec<PathBuf> = scanner
            .walk(Category::ALL.to_vec(), None)
            .map_ok(|record| record.path)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(
            paths,
            vec![
                root.join("maybe/4chan/pol/9.gif"),
                root.join("pepe/4chan/b/1.png"),
                root.join("pepe/4chan/pol/1.png"),
                root.join("pepe/4chan/pol/2.png"),
                root.join("pepe/archive/g/notes.txt"),
                root.join("pepe/archive/pol/3.jpg"),
            ]
        );
    }

    #[tokio::test]
    async fn extension_filter_is_case_insensitive() {
        let temp_dir = fixture();
        touch(temp_dir.path(), "pepe/4chan/pol/LOUD.PNG");
        let scanner = TreeScanner::new(temp_dir.path())
            .with_extensions([".png", "JPG"]);

        let paths: Vec<PathBuf> = scanner
            .walk(vec![Category::Pepe], None)
            .map_ok(|record| record.path)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(paths.len(), 5);
        assert!(paths.iter().all(|path| !path.ends_with("notes.txt")));
    }

    #[tokio::test]
    async fn dot_prefixed_boards_are_invisible() {
        let temp_dir = fixture();
        touch(temp_dir.path(), "pepe/4chan/.hidden/5.png");
        let scanner = TreeScanner::new(temp_dir.path());

        let boards = scanner.list_boards(Some(Category::Pepe)).await.unwrap();
        assert!(boards.iter().all(|board| board.as_str() != ".hidden"));

        let paths: Vec<PathBuf> = scanner
            .walk(vec![Category::Pepe], None)
            .map_ok(|record| record.path)
            .try_collect()
            .await
            .unwrap();
        assert!(paths.iter().all(|path| !path.ends_with("5.png")));

        let records: Vec<ImageRecord> = scanner
            .enumerate_images(Category::Pepe, Board::from(".hidden"))
            .try_collect()
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn traversal_board_names_match_nothing() {
        let temp_dir = fixture();
        touch(temp_dir.path(), "pepe/stray.png");
        let scanner = TreeScanner::new(temp_dir.path());

        for board in ["..", "../4chan", "/pol", ".", "pol/../b"] {
            let records: Vec<ImageRecord> = scanner
                .walk(vec![Category::Pepe], Some(Board::from(board)))
                .try_collect()
                .await
                .unwrap();
            assert!(records.is_empty(), "{board} should not match");
        }
    }

    #[tokio::test]
    async fn missing_root_is_backing_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = TreeScanner::new(temp_dir.path().join("nope"));

        let err = scanner.list_boards(None).await.unwrap_err();
        assert!(matches!(err, CatalogError::BackingUnavailable(_)));

        let err = scanner
            .select_images(&Selection::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::BackingUnavailable(_)));
    }
}
