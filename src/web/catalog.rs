use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{PageContext, WebError};
use crate::api::AppState;
use crate::entities::products;

/// Product fields pre-formatted for rendering.
#[derive(Clone)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub price: String,
    pub inventory: i32,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

impl From<products::Model> for ProductView {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            price: format!("{:.2}", model.price),
            inventory: model.inventory,
            category: model.category,
            image_url: model.image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub products: Vec<ProductView>,
    pub categories: Vec<String>,
    pub search: String,
    pub selected_category: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub page: PageContext,
    pub product: ProductView,
}

/// GET / with optional `search` and `category` filters.
pub async fn home(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BrowseQuery>,
    session: Session,
) -> Result<HomeTemplate, WebError> {
    let products = state
        .store
        .browse_products(query.search.as_deref(), query.category.as_deref())
        .await?;
    let categories = state.store.product_categories().await?;

    Ok(HomeTemplate {
        page: PageContext::build(&state, &session).await,
        products: products.into_iter().map(ProductView::from).collect(),
        categories,
        search: query.search.unwrap_or_default(),
        selected_category: query.category.unwrap_or_default(),
    })
}

/// GET /product/{id}
pub async fn product_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    session: Session,
) -> Result<Response, WebError> {
    let Some(product) = state.store.get_product(id).await? else {
        return Ok((StatusCode::NOT_FOUND, "Product not found").into_response());
    };

    Ok(ProductTemplate {
        page: PageContext::build(&state, &session).await,
        product: ProductView::from(product),
    }
    .into_response())
}
