use std::sync::Arc;

use tracing::{Level, info};

use common::FilesystemMediaStore;
use server::config::AppConfig;
use server::database::init_db;
use server::state::AppState;
use server::{build_router, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = init_db(&config.database.url).await?;
    seed::ensure_indexes(&db).await?;

    let media = FilesystemMediaStore::new(
        config.storage.root_dir.clone().into(),
        config.storage.max_file_size,
    )
    .await?;

    let state = AppState {
        db,
        media: Arc::new(media),
        config: config.clone(),
    };

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
