use anyhow::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use crate::entities::{orders, prelude::*};

pub struct OrderRepository {
    conn: DatabaseConnection,
}

impl OrderRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn count_for_user(&self, user_id: i32) -> Result<u64> {
        let count = Orders::find()
            .filter(orders::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await?;
        Ok(count)
    }
}
