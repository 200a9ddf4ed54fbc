use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use thiserror::Error;
use tracing::debug;

use crate::entities::{cart_items, prelude::*, products};

/// Typed failures of the add-to-cart guard.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Product {0} not found")]
    ProductNotFound(i32),

    #[error("Cannot add more items than available inventory")]
    InsufficientInventory,

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
}

/// A cart row paired with its product. Rows whose product has since been
/// deleted are skipped at listing time, never surfaced as errors.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub item: cart_items::Model,
    pub product: products::Model,
}

pub struct CartRepository {
    conn: DatabaseConnection,
}

impl CartRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert one cart row for (user, product), guarded by availability:
    /// rows already held by this user for this product count against the
    /// product's inventory.
    pub async fn add(&self, user_id: i32, product_id: i32) -> Result<cart_items::Model, CartError> {
        let product = Products::find_by_id(product_id)
            .one(&self.conn)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        let held = CartItems::find()
            .filter(cart_items::Column::UserId.eq(user_id))
            .filter(cart_items::Column::ProductId.eq(product_id))
            .count(&self.conn)
            .await?;

        if held >= u64::try_from(product.inventory).unwrap_or(0) {
            return Err(CartError::InsufficientInventory);
        }

        let active = cart_items::ActiveModel {
            user_id: Set(user_id),
            product_id: Set(product_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let res = CartItems::insert(active).exec(&self.conn).await?;
        debug!("User {} added product {} to cart", user_id, product_id);

        CartItems::find_by_id(res.last_insert_id)
            .one(&self.conn)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))
    }

    /// Delete a cart row if and only if it belongs to the user.
    /// A row owned by someone else (or absent) is a silent no-op.
    pub async fn remove(&self, user_id: i32, cart_item_id: i32) -> Result<()> {
        CartItems::delete_many()
            .filter(cart_items::Column::Id.eq(cart_item_id))
            .filter(cart_items::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    /// All of a user's cart rows joined with their products, insertion order.
    pub async fn list(&self, user_id: i32) -> Result<Vec<CartLine>> {
        let rows = CartItems::find()
            .filter(cart_items::Column::UserId.eq(user_id))
            .order_by_asc(cart_items::Column::Id)
            .find_also_related(Products)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(item, product)| product.map(|product| CartLine { item, product }))
            .collect())
    }

    /// Sum of unit prices across all live rows. O(n) recompute, no caching.
    pub async fn total(&self, user_id: i32) -> Result<f64> {
        let lines = self.list(user_id).await?;
        Ok(lines.iter().map(|l| l.product.price).sum())
    }

    pub async fn count(&self, user_id: i32) -> Result<u64> {
        let count = CartItems::find()
            .filter(cart_items::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await?;
        Ok(count)
    }
}
