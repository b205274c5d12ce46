use axum::{
    routing::{get, post},
    Router,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::{str::FromStr, sync::Arc};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

mod config;
mod db;
mod error;
mod finalize;
mod handlers;
mod models;

use config::Config;
use handlers::{create_video, get_video, list_videos, patch_video, split_video};
use models::AppState;

/// API routes nested under /api, static assets served from the root path.
pub fn app_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/videos", post(create_video).get(list_videos))
        .route("/videos/:id", get(get_video).patch(patch_video))
        .route("/videos/:id/split", post(split_video));

    Router::new()
        .nest("/api", api)
        .fallback_service(ServeDir::new(&state.config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("video_catalog_backend=debug,tower_http=debug")
        .init();

    // Load configuration
    let config = Config::from_env();

    // Open the database, creating the file on first run
    let connect_options =
        SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect_with(connect_options)
        .await?;
    db::init(&pool).await?;

    // Create app state
    let app_state = Arc::new(AppState {
        pool,
        config: config.clone(),
    });

    let app = app_router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    info!("🚀 Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("{}", "=".repeat(60));
    println!("✅ Server running on http://0.0.0.0:{}", config.port);
    println!("✅ Server accessible at http://localhost:{}", config.port);
    println!("{}", "=".repeat(60));
    println!("   Database: {}", config.database_url);
    println!("   Static Dir: {:?}", config.static_dir);
    println!("   DB Connections: {}", config.max_db_connections);
    println!("{}", "=".repeat(60));

    info!("✅ Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
