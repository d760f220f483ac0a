use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, services::ServeDir};

use titan_backend::{api, config::Config, db::Database, uwu::LogFetcher};

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "titan-backend" }))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Arc::new(Config::load());

    let db = Database::new(&config.database_url)
        .await
        .expect("Failed to initialize database");
    let db = Arc::new(db);

    let fetcher = Arc::new(LogFetcher::new(
        &config.uwu_base_url,
        Duration::from_secs(config.fetch_timeout_secs),
    ));

    let mut app = Router::new()
        .route("/health", get(health_check))
        .merge(api::router(db, fetcher, config.clone()));

    if let Some(static_dir) = &config.static_dir {
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    let app = app.layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to port {}", config.port));

    tracing::info!("Titan backend listening on port {}", config.port);
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
