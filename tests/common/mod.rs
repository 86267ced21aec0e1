use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;

use storefront_api::api::create_api_router;
use storefront_api::entities::setup_schema;

/// Boots the real router on an ephemeral port over a fresh in-memory SQLite
/// database. The pool is pinned to a single connection so the in-memory
/// database lives as long as the app does.
pub async fn spawn_app() -> String {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to in-memory database");
    setup_schema(&db).await.expect("Failed to create schema");

    let app = create_api_router(Arc::new(db));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read listener address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server stopped");
    });

    format!("http://{addr}")
}
