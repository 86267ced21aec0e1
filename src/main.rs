use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use storefront_api::api::create_api_router;
use storefront_api::entities::setup_schema;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3000);

    let db: DatabaseConnection = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");
    setup_schema(&db).await.expect("Failed to create schema");

    let shared_db = Arc::new(db);
    let app = create_api_router(shared_db);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("Failed to bind listen address");
    tracing::info!("API listening on http://{}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Server stopped");
}
