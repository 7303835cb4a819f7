use std::sync::Arc;

use course_catalog::api::router;
use course_catalog::catalog::CatalogStore;
use course_catalog::config::{AppConfig, SourceKind};
use course_catalog::error::AppError;
use course_catalog::services::CatalogRefresher;
use course_catalog::source::{CourseSource, HttpSource, MemorySource, SqliteSource, seed};
use course_catalog::state::AppState;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn build_source(config: &AppConfig) -> Result<Arc<dyn CourseSource>, AppError> {
    let source: Arc<dyn CourseSource> = match config.source {
        SourceKind::Sqlite => {
            let sqlite = SqliteSource::connect(&config.database_url).await?;
            if config.seed_demo_data {
                sqlite.seed_if_empty(&seed::demo_courses()?).await?;
            }
            Arc::new(sqlite)
        }
        SourceKind::Http => {
            let http = config
                .http
                .clone()
                .ok_or_else(|| AppError::Config("COURSE_API_URL is not set".to_string()))?;
            Arc::new(HttpSource::new(http)?)
        }
        SourceKind::Memory => Arc::new(MemorySource::with_seed()?),
    };
    Ok(source)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "course_catalog=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;
    info!("using {:?} course source", config.source);

    let source = build_source(&config).await?;
    let catalog = Arc::new(CatalogStore::default());

    // The API can start with an empty catalog; the refresher or
    // POST /catalog/refresh fills it in later.
    if let Err(e) = catalog.refresh(source.as_ref()).await {
        warn!("initial catalog load failed: {}", e);
    }

    if config.refresh_interval_secs > 0 {
        let refresher =
            CatalogRefresher::new(catalog.clone(), source.clone(), config.refresh_interval_secs);
        tokio::spawn(refresher.start());
    }

    let state = AppState::new(catalog, source, config.page_size);
    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
