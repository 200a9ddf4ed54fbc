use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{products, users::UserRole};

pub mod migrator;
pub mod repositories;

pub use repositories::cart::{CartError, CartLine};
pub use repositories::product::{NewProduct, ProductUpdate};
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn product_repo(&self) -> repositories::product::ProductRepository {
        repositories::product::ProductRepository::new(self.conn.clone())
    }

    fn cart_repo(&self) -> repositories::cart::CartRepository {
        repositories::cart::CartRepository::new(self.conn.clone())
    }

    fn order_repo(&self) -> repositories::order::OrderRepository {
        repositories::order::OrderRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        role: UserRole,
        security: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create(username, password, role, security)
            .await
    }

    pub async fn verify_user_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>> {
        self.user_repo().verify_password(username, password).await
    }

    // ========== Products ==========

    pub async fn get_product(&self, id: i32) -> Result<Option<products::Model>> {
        self.product_repo().get(id).await
    }

    pub async fn list_products(&self) -> Result<Vec<products::Model>> {
        self.product_repo().list_all().await
    }

    pub async fn browse_products(
        &self,
        search: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<products::Model>> {
        self.product_repo().browse(search, category).await
    }

    pub async fn product_categories(&self) -> Result<Vec<String>> {
        self.product_repo().categories().await
    }

    pub async fn add_product(&self, product: NewProduct) -> Result<i32> {
        self.product_repo().create(product).await
    }

    pub async fn update_product(&self, id: i32, update: ProductUpdate) -> Result<bool> {
        self.product_repo().update(id, update).await
    }

    pub async fn remove_product(&self, id: i32) -> Result<bool> {
        self.product_repo().remove(id).await
    }

    // ========== Cart ==========

    pub async fn add_to_cart(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<crate::entities::cart_items::Model, CartError> {
        self.cart_repo().add(user_id, product_id).await
    }

    pub async fn remove_from_cart(&self, user_id: i32, cart_item_id: i32) -> Result<()> {
        self.cart_repo().remove(user_id, cart_item_id).await
    }

    pub async fn list_cart(&self, user_id: i32) -> Result<Vec<CartLine>> {
        self.cart_repo().list(user_id).await
    }

    pub async fn cart_total(&self, user_id: i32) -> Result<f64> {
        self.cart_repo().total(user_id).await
    }

    pub async fn cart_count(&self, user_id: i32) -> Result<u64> {
        self.cart_repo().count(user_id).await
    }

    // ========== Orders ==========

    pub async fn order_count_for_user(&self, user_id: i32) -> Result<u64> {
        self.order_repo().count_for_user(user_id).await
    }
}
