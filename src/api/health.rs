use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use crate::error::ApiError;

#[derive(Clone, Copy)]
struct StartedAt(Instant);

//ROUTERS
pub fn health_router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/db-ping", get(db_ping))
        .layer(Extension(StartedAt(Instant::now())))
}

//ROUTES
async fn health(Extension(StartedAt(started)): Extension<StartedAt>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "uptime": started.elapsed().as_secs_f64()
        })),
    )
        .into_response()
}

async fn db_ping(Extension(db): Extension<Arc<DatabaseConnection>>) -> Result<Response, ApiError> {
    db.ping().await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "now": Utc::now()
        })),
    )
        .into_response())
}
