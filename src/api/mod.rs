pub mod assembly;
pub mod cart;
pub mod health;
pub mod order;
pub mod product;
pub mod user;

use axum::{extract::Extension, middleware, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::middleware::logging::logging_middleware;

use cart::cart_router;
use health::health_router;
use order::order_router;
use product::product_router;
use user::user_router;

/// Builds the full HTTP surface. The storage handle is constructed by the
/// caller and shared read-only with every handler through an Extension.
pub fn create_api_router(shared_db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .merge(health_router())
        .merge(product_router())
        .merge(user_router())
        .merge(cart_router())
        .merge(order_router())
        .layer(Extension(shared_db))
        .layer(middleware::from_fn(logging_middleware))
}
