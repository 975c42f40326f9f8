use std::fs;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use findpepe_core::{
    CatalogStore, PageRequest, PathTranslator, SelectionEngine, TreeScanner,
};
use tempfile::TempDir;

/// `(category, source, board, file)` in tree walk order, so row ids and
/// directory order agree.
pub const CORPUS: &[(&str, &str, &str, &str)] = &[
    ("non-pepe", "4chan", "a", "n1.png"),
    ("pepe", "4chan", "a", "p1.png"),
    ("pepe", "4chan", "a", "p2.png"),
    ("pepe", "4chan", "b", "p4.png"),
    ("pepe", "archive", "a", "p3.png"),
    ("pepe", "archive", "b", "p5.png"),
    ("unclassified", "4chan", "z", "u1.png"),
];

pub const PUBLIC_PREFIX: &str = "/images";

pub struct Corpus {
    _dir: TempDir,
    pub root: PathBuf,
    pub tree: TreeScanner,
    pub store: CatalogStore,
}

impl Corpus {
    /// The same corpus behind each backing, labelled for assertion messages.
    pub fn engines(&self) -> Vec<(&'static str, SelectionEngine)> {
        let translator = PathTranslator::new(&self.root, PUBLIC_PREFIX);
        vec![
            (
                "tree",
                SelectionEngine::new(
                    Arc::new(self.tree.clone()),
                    translator.clone(),
                ),
            ),
            (
                "store",
                SelectionEngine::new(Arc::new(self.store.clone()), translator),
            ),
        ]
    }
}

pub async fn build_corpus() -> Result<Corpus> {
    let dir = TempDir::new()?;
    let root = dir.path().join("image");

    for (category, source, board, file) in CORPUS {
        let board_dir = root.join(category).join(source).join(board);
        fs::create_dir_all(&board_dir)?;
        fs::write(board_dir.join(file), b"not really an image")?;
    }

    let db_path = dir.path().join("catalog.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    let store = CatalogStore::connect(&url, 1).await?;
    store.run_migrations().await?;

    for (id, (category, source, board, file)) in CORPUS.iter().enumerate() {
        let relative = format!("{category}/{source}/{board}/{file}");
        sqlx::query(
            "INSERT INTO images (id, file_path, category, board, classification, href) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id as i64 + 1)
        .bind(relative)
        .bind(category.to_string())
        .bind(board.to_string())
        .bind(0.5_f64)
        .bind(format!("https://i.4cdn.org/{board}/{file}"))
        .execute(store.pool())
        .await?;
    }

    let tree = TreeScanner::new(&root);
    Ok(Corpus {
        _dir: dir,
        root,
        tree,
        store,
    })
}

pub fn page(index: u64, size: u32) -> PageRequest {
    PageRequest::new(index, NonZeroU32::new(size).expect("non-zero page size"))
}
