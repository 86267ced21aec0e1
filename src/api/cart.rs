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
    cart::{self, Entity as CartEntity},
    cart_item, product,
};
use crate::error::ApiError;

//ROUTERS
pub fn cart_router() -> Router {
    Router::new()
        .route("/carts", get(get_carts).post(create_cart))
        .route("/carts/:id", get(get_cart).delete(delete_cart))
        .route("/carts/:id/item", put(upsert_item))
}

//ROUTES
async fn get_carts(Extension(db): Extension<Arc<DatabaseConnection>>) -> Result<Response, ApiError> {
    let carts = CartEntity::find()
        .order_by_asc(cart::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(carts)).into_response())
}

async fn get_cart(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let cart = CartEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Cart not found".to_owned()))?;

    let items = cart_items_view(&*db, cart.id).await?;

    Ok((StatusCode::OK, Json(CartWithItems::new(cart, items))).into_response())
}

async fn create_cart(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateCart>,
) -> Result<Response, ApiError> {
    let user_id = payload
        .user_id
        .ok_or_else(|| ApiError::Validation("user id is required".to_owned()))?;
    let items = match payload.items {
        Some(items) if !items.is_empty() => items,
        _ => return Err(ApiError::Validation("no items in cart".to_owned())),
    };

    // Carts store quantities only; items are priced at the catalog's current
    // price whenever the cart is read back.
    resolve_products(&*db, &items).await?;

    let txn = db.begin().await?;

    let cart = cart::ActiveModel {
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for item in &items {
        cart_item::ActiveModel {
            cart_id: Set(cart.id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    let items = cart_items_view(&txn, cart.id).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(CartWithItems::new(cart, items))).into_response())
}

async fn upsert_item(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<UpsertItem>,
) -> Result<Response, ApiError> {
    let (product_id, quantity) = match (payload.product_id, payload.quantity) {
        (Some(product_id), Some(quantity)) => (product_id, quantity),
        _ => {
            return Err(ApiError::Validation(
                "product_id and numeric quantity required".to_owned(),
            ))
        }
    };

    // Existence comes first: a mutation against a nonexistent cart must not
    // leave an orphan row behind.
    let cart = CartEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Cart not found".to_owned()))?;

    let txn = db.begin().await?;

    if quantity <= 0 {
        // Removal is idempotent; deleting an absent entry is a no-op.
        cart_item::Entity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
    } else {
        if product::Entity::find_by_id(product_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(ApiError::Validation(format!(
                "No product with {product_id} id was found"
            )));
        }

        // Upsert keyed on the (cart, product) pair: overwrite the quantity
        // if an entry already exists, insert otherwise.
        let existing = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?;
        match existing {
            Some(entry) => {
                let mut entry: cart_item::ActiveModel = entry.into();
                entry.quantity = Set(quantity);
                entry.update(&txn).await?;
            }
            None => {
                cart_item::ActiveModel {
                    cart_id: Set(cart.id),
                    product_id: Set(product_id),
                    quantity: Set(quantity),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
        }
    }

    let items = cart_items_view(&txn, cart.id).await?;
    txn.commit().await?;

    Ok((StatusCode::OK, Json(CartWithItems::new(cart, items))).into_response())
}

async fn delete_cart(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let cart = CartEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Cart not found".to_owned()))?;

    cart::ActiveModel::from(cart.clone()).delete(&*db).await?;

    Ok((StatusCode::OK, Json(cart)).into_response())
}

//Helpers
async fn cart_items_view<C: ConnectionTrait>(
    conn: &C,
    cart_id: i32,
) -> Result<Vec<CartItemView>, ApiError> {
    let items = cart_item::Entity::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .join(JoinType::InnerJoin, cart_item::Relation::Product.def())
        .select_only()
        .column_as(cart_item::Column::ProductId, "product_id")
        .column_as(product::Column::Name, "name")
        .column_as(cart_item::Column::Quantity, "quantity")
        .column_as(product::Column::Price, "price")
        .order_by_asc(cart_item::Column::Id)
        .into_model::<CartItemView>()
        .all(conn)
        .await?;

    Ok(items)
}

//Structs
#[derive(Deserialize, Clone, Debug)]
struct CreateCart {
    user_id: Option<i32>,
    items: Option<Vec<LineItemInput>>,
}

#[derive(Deserialize, Clone, Debug)]
struct UpsertItem {
    product_id: Option<i32>,
    quantity: Option<i32>,
}

// Carts carry no price snapshot, so the view reads the current one.
#[derive(Serialize, FromQueryResult)]
struct CartItemView {
    product_id: i32,
    name: String,
    quantity: i32,
    price: f64,
}

#[derive(Serialize)]
struct CartWithItems {
    id: i32,
    user_id: i32,
    created_at: DateTime<Utc>,
    items: Vec<CartItemView>,
}

impl CartWithItems {
    fn new(cart: cart::Model, items: Vec<CartItemView>) -> CartWithItems {
        CartWithItems {
            id: cart.id,
            user_id: cart.user_id,
            created_at: cart.created_at,
            items,
        }
    }
}
