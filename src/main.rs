//! mnemo - language-learning content service
//!
//! Serves learning-set CRUD and export/import, AI content generation, and
//! narration audio over a CORS-open HTTP API.

use anyhow::Result;
use mnemo::{build_router, config::AppConfig, db, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting mnemo v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    let data_dir = config.resolve_data_dir()?;
    info!("Data folder: {}", data_dir.display());

    let db_path = config.database_path(&data_dir);
    info!("Database path: {}", db_path.display());
    let pool = db::init_database(&db_path).await?;
    info!("✓ Database ready");

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(pool, config, data_dir);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("✓ Listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
