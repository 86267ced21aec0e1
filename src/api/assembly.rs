//! Shared validation and pricing for the order/cart assembly flow: both
//! parents take the same (product, quantity) line-item input and both must
//! see every referenced product before anything is written.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::entities::product;
use crate::error::ApiError;

#[derive(Deserialize, Clone, Debug)]
pub struct LineItemInput {
    pub product_id: i32,
    pub quantity: i32,
}

/// Checks the line-item preconditions and resolves every referenced product
/// in one batched query, keyed by id.
///
/// The lookup is over the distinct ids and the found count is compared
/// against the distinct count, so a request listing the same product on two
/// lines is legal and each line prices independently.
pub async fn resolve_products<C: ConnectionTrait>(
    conn: &C,
    items: &[LineItemInput],
) -> Result<BTreeMap<i32, product::Model>, ApiError> {
    if items.iter().any(|item| item.quantity < 1) {
        return Err(ApiError::Validation(
            "quantity must be a positive integer".to_owned(),
        ));
    }

    let mut product_ids: Vec<i32> = items.iter().map(|item| item.product_id).collect();
    product_ids.sort_unstable();
    product_ids.dedup();

    let products = product::Entity::find()
        .filter(product::Column::Id.is_in(product_ids.clone()))
        .all(conn)
        .await?;

    if products.len() != product_ids.len() {
        return Err(ApiError::Validation(
            "one or more products not found".to_owned(),
        ));
    }

    Ok(products
        .into_iter()
        .map(|product| (product.id, product))
        .collect())
}
