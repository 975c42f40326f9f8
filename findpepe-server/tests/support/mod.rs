use std::{fs, path::Path, sync::Arc};

use anyhow::{Result, anyhow};
use axum_test::TestServer;
use findpepe_server::{
    create_app,
    infra::{
        config::{BackendKind, Config},
        startup::{ResourceBootstrap, connect_store, wire_app_resources},
    },
};
use tempfile::TempDir;

/// `(category, source, board, file)`
pub const IMAGES: &[(&str, &str, &str, &str)] = &[
    ("non-pepe", "4chan", "a", "n1.png"),
    ("pepe", "4chan", "a", "p1.png"),
    ("pepe", "4chan", "a", "p2.png"),
    ("pepe", "4chan", "b", "p4.png"),
    ("pepe", "archive", "a", "p3.png"),
    ("pepe", "archive", "b", "p5.png"),
];

/// Extra images on `maybe/4chan/pol` so the unfiltered listing spans pages.
pub const FILLER_COUNT: usize = 27;

pub struct TestCatalog {
    pub server: TestServer,
    pub root: std::path::PathBuf,
    _tempdir: TempDir,
}

pub fn write_tree(root: &Path) -> Result<()> {
    for (category, source, board, file) in IMAGES {
        let dir = root.join(category).join(source).join(board);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(file), format!("{category}/{board}/{file}"))?;
    }

    let filler = root.join("maybe/4chan/pol");
    fs::create_dir_all(&filler)?;
    for i in 0..FILLER_COUNT {
        fs::write(filler.join(format!("img{i:02}.png")), b"maybe")?;
    }
    Ok(())
}

pub async fn tree_catalog(
    configure: impl FnOnce(&mut Config),
) -> Result<TestCatalog> {
    let tempdir = TempDir::new()?;
    let root = tempdir.path().join("image");
    write_tree(&root)?;

    let mut config = Config::default();
    config.catalog.storage_root = root.clone();
    configure(&mut config);

    serve(config, root, tempdir).await
}

/// Same corpus, served from a SQLite catalog table with root-relative paths.
pub async fn store_catalog() -> Result<TestCatalog> {
    let tempdir = TempDir::new()?;
    let root = tempdir.path().join("image");
    write_tree(&root)?;

    let mut config = Config::default();
    config.catalog.storage_root = root.clone();
    config.catalog.backend = BackendKind::Store;
    config.database.url = Some(format!(
        "sqlite://{}?mode=rwc",
        tempdir.path().join("catalog.db").display()
    ));
    config.database.max_connections = 1;
    config.database.run_migrations = true;

    let catalog = serve(config.clone(), root, tempdir).await?;
    let store = connect_store(&config).await?;
    for (id, (category, source, board, file)) in IMAGES.iter().enumerate() {
        sqlx::query(
            "INSERT INTO images (id, file_path, category, board) VALUES ($1, $2, $3, $4)",
        )
        .bind(id as i64 + 1)
        .bind(format!("{category}/{source}/{board}/{file}"))
        .bind(category.to_string())
        .bind(board.to_string())
        .execute(store.pool())
        .await?;
    }
    store.close().await;

    Ok(catalog)
}

async fn serve(
    config: Config,
    root: std::path::PathBuf,
    tempdir: TempDir,
) -> Result<TestCatalog> {
    let ResourceBootstrap { state, .. } =
        wire_app_resources(Arc::new(config)).await?;
    let server = TestServer::new(create_app(state))
        .map_err(|err| anyhow!(err.to_string()))?;

    Ok(TestCatalog {
        server,
        root,
        _tempdir: tempdir,
    })
}
