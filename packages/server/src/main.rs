use std::sync::Arc;

use tracing::{Level, info};

use server::config::AppConfig;
use server::email::Mailer;
use server::state::AppState;
use server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = database::init_db(&config.database).await?;
    seed::seed_first_superuser(&db, &config.seed).await?;

    tokio::fs::create_dir_all(&config.uploads.dir).await?;

    let mailer = Arc::new(Mailer::new(&config.email)?);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState { db, config, mailer };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
