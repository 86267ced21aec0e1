use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::assembly::{resolve_products, LineItemInput};
use crate::entities::{
    order::{self, Entity as OrderEntity},
    order_item, product,
};
use crate::error::ApiError;

//ROUTERS
pub fn order_router() -> Router {
    Router::new()
        .route("/orders", get(get_orders).post(create_order))
        .route("/orders/:id", get(get_order).delete(delete_order))
        .route("/orders/:id/status", put(update_status))
}

//ROUTES
async fn get_orders(
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let orders = OrderEntity::find()
        .order_by_asc(order::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(orders)).into_response())
}

async fn get_order(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let order = OrderEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_owned()))?;

    let items = order_items_view(&*db, order.id).await?;

    Ok((StatusCode::OK, Json(OrderWithItems::new(order, items))).into_response())
}

async fn create_order(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateOrder>,
) -> Result<Response, ApiError> {
    let user_id = payload
        .user_id
        .ok_or_else(|| ApiError::Validation("user id is required".to_owned()))?;
    let items = match payload.items {
        Some(items) if !items.is_empty() => items,
        _ => return Err(ApiError::Validation("no items on order".to_owned())),
    };

    let products = resolve_products(&*db, &items).await?;

    // Price every line at its looked-up price; the snapshot below is what
    // insulates historical orders from later catalog changes.
    let total: f64 = items
        .iter()
        .map(|item| products[&item.product_id].price * f64::from(item.quantity))
        .sum();

    // Parent and children go in one transaction. An error drops the
    // transaction, which rolls the parent insert back with it.
    let txn = db.begin().await?;

    let order = order::ActiveModel {
        user_id: Set(user_id),
        total: Set(total),
        status: Set("pending".to_owned()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for item in &items {
        order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            unit_price: Set(products[&item.product_id].price),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    let items = order_items_view(&txn, order.id).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(OrderWithItems::new(order, items))).into_response())
}

async fn update_status(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<UpdateStatus>,
) -> Result<Response, ApiError> {
    let status = match payload.status.as_deref().map(str::trim) {
        Some(status) if !status.is_empty() => status.to_owned(),
        _ => return Err(ApiError::Validation("status is required".to_owned())),
    };

    let order = OrderEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_owned()))?;

    let mut active: order::ActiveModel = order.into();
    active.status = Set(status);
    let updated = active.update(&*db).await?;

    Ok((StatusCode::OK, Json(updated)).into_response())
}

async fn delete_order(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let order = OrderEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_owned()))?;

    // Line items go with the parent via the declared cascade.
    order::ActiveModel::from(order.clone()).delete(&*db).await?;

    Ok((StatusCode::OK, Json(order)).into_response())
}

//Helpers
async fn order_items_view<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
) -> Result<Vec<OrderItemView>, ApiError> {
    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .join(JoinType::InnerJoin, order_item::Relation::Product.def())
        .select_only()
        .column_as(order_item::Column::ProductId, "product_id")
        .column_as(product::Column::Name, "name")
        .column_as(order_item::Column::Quantity, "quantity")
        .column_as(order_item::Column::UnitPrice, "unit_price")
        .order_by_asc(order_item::Column::Id)
        .into_model::<OrderItemView>()
        .all(conn)
        .await?;

    Ok(items)
}

//Structs
#[derive(Deserialize, Clone, Debug)]
struct CreateOrder {
    user_id: Option<i32>,
    items: Option<Vec<LineItemInput>>,
}

#[derive(Deserialize, Clone, Debug)]
struct UpdateStatus {
    status: Option<String>,
}

#[derive(Serialize, FromQueryResult)]
struct OrderItemView {
    product_id: i32,
    name: String,
    quantity: i32,
    unit_price: f64,
}

#[derive(Serialize)]
struct OrderWithItems {
    id: i32,
    user_id: i32,
    total: f64,
    status: String,
    created_at: DateTime<Utc>,
    items: Vec<OrderItemView>,
}

impl OrderWithItems {
    fn new(order: order::Model, items: Vec<OrderItemView>) -> OrderWithItems {
        OrderWithItems {
            id: order.id,
            user_id: order.user_id,
            total: order.total,
            status: order.status,
            created_at: order.created_at,
            items,
        }
    }
}
