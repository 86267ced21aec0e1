use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;

use crate::entities::product::{self, Entity as ProductEntity};
use crate::error::ApiError;

//ROUTERS
pub fn product_router() -> Router {
    Router::new()
        .route("/products", get(get_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

//ROUTES
async fn get_products(
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let products = ProductEntity::find()
        .order_by_asc(product::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(products)).into_response())
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let product = ProductEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_owned()))?;

    Ok((StatusCode::OK, Json(product)).into_response())
}

async fn create_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<ProductPayload>,
) -> Result<Response, ApiError> {
    let (name, price, stock) = payload.validated()?;

    let new_product = product::ActiveModel {
        name: Set(name),
        description: Set(payload.description),
        price: Set(price),
        stock: Set(stock),
        ..Default::default()
    };
    let created = new_product.insert(&*db).await?;

    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn update_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<ProductPayload>,
) -> Result<Response, ApiError> {
    let (name, price, stock) = payload.validated()?;

    let existing = ProductEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_owned()))?;

    // Full replace, so an absent description clears the stored one.
    let mut active: product::ActiveModel = existing.into();
    active.name = Set(name);
    active.description = Set(payload.description);
    active.price = Set(price);
    active.stock = Set(stock);
    let updated = active.update(&*db).await?;

    Ok((StatusCode::OK, Json(updated)).into_response())
}

async fn delete_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let product = ProductEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_owned()))?;

    product::ActiveModel::from(product.clone()).delete(&*db).await?;

    Ok((StatusCode::OK, Json(product)).into_response())
}

//Structs
#[derive(Deserialize, Clone, Debug)]
struct ProductPayload {
    name: Option<String>,
    description: Option<String>,
    price: Option<f64>,
    stock: Option<i32>,
}

impl ProductPayload {
    // Same rules on create and update: name present and non-empty, price and
    // stock present and non-negative.
    fn validated(&self) -> Result<(String, f64, i32), ApiError> {
        let name = match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => return Err(ApiError::Validation("name is required".to_owned())),
        };

        let price = self
            .price
            .ok_or_else(|| ApiError::Validation("price is required".to_owned()))?;
        if price < 0.0 {
            return Err(ApiError::Validation(
                "price must be non-negative".to_owned(),
            ));
        }

        let stock = self
            .stock
            .ok_or_else(|| ApiError::Validation("stock is required".to_owned()))?;
        if stock < 0 {
            return Err(ApiError::Validation(
                "stock must be non-negative".to_owned(),
            ));
        }

        Ok((name, price, stock))
    }
}
