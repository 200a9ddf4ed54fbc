use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::info;

use crate::entities::{prelude::*, products};

/// Fields accepted by product creation.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub inventory: i32,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

/// Partial update: `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub inventory: Option<i32>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<products::Model>> {
        let product = Products::find_by_id(id).one(&self.conn).await?;
        Ok(product)
    }

    pub async fn list_all(&self) -> Result<Vec<products::Model>> {
        let rows = Products::find()
            .order_by_asc(products::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    /// Browse listing with optional case-insensitive name search and exact
    /// category filter.
    pub async fn browse(
        &self,
        search: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<products::Model>> {
        let mut query = Products::find();

        if let Some(search) = search
            && !search.is_empty()
        {
            query = query.filter(products::Column::Name.contains(search));
        }

        if let Some(category) = category
            && !category.is_empty()
        {
            query = query.filter(products::Column::Category.eq(category));
        }

        let rows = query
            .order_by_asc(products::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    /// Distinct non-empty categories, for the browse filter dropdown.
    pub async fn categories(&self) -> Result<Vec<String>> {
        let rows: Vec<Option<String>> = Products::find()
            .select_only()
            .column(products::Column::Category)
            .distinct()
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .flatten()
            .filter(|c| !c.is_empty())
            .collect())
    }

    pub async fn create(&self, product: NewProduct) -> Result<i32> {
        let active = products::ActiveModel {
            name: Set(product.name.clone()),
            price: Set(product.price),
            inventory: Set(product.inventory),
            category: Set(product.category),
            image_url: Set(product.image_url),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let res = Products::insert(active).exec(&self.conn).await?;
        info!("Added product {}: {}", res.last_insert_id, product.name);
        Ok(res.last_insert_id)
    }

    /// Apply a partial update. Returns false when the product does not exist.
    pub async fn update(&self, id: i32, update: ProductUpdate) -> Result<bool> {
        let Some(existing) = Products::find_by_id(id).one(&self.conn).await? else {
            return Ok(false);
        };

        let mut active: products::ActiveModel = existing.into();

        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(price) = update.price {
            active.price = Set(price);
        }
        if let Some(inventory) = update.inventory {
            active.inventory = Set(inventory);
        }
        if let Some(category) = update.category {
            active.category = Set(Some(category));
        }
        if let Some(image_url) = update.image_url {
            active.image_url = Set(Some(image_url));
        }

        sea_orm::ActiveModelTrait::update(active, &self.conn).await?;
        Ok(true)
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = Products::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
