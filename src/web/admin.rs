use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::info;

use super::{PageContext, WebError, catalog::ProductView, flash};
use crate::api::AppState;
use crate::db::{NewProduct, ProductUpdate};

#[derive(Template, WebTemplate)]
#[template(path = "admin_products.html")]
pub struct AdminProductsTemplate {
    pub page: PageContext,
    pub products: Vec<ProductView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "add_product.html")]
pub struct AddProductTemplate {
    pub page: PageContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "edit_product.html")]
pub struct EditProductTemplate {
    pub page: PageContext,
    pub product: ProductView,
}

#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub price: String,
    pub inventory: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// GET /admin_products
pub async fn product_list(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<AdminProductsTemplate, WebError> {
    let products = state.store.list_products().await?;

    Ok(AdminProductsTemplate {
        page: PageContext::build(&state, &session).await,
        products: products.into_iter().map(ProductView::from).collect(),
    })
}

/// GET /add_product
pub async fn add_product_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> AddProductTemplate {
    AddProductTemplate {
        page: PageContext::build(&state, &session).await,
    }
}

/// POST /add_product
pub async fn add_product(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Redirect, WebError> {
    let name = form.name.trim().to_string();
    if name.is_empty() {
        flash(&session, "Product name is required.").await;
        return Ok(Redirect::to("/add_product"));
    }

    let Ok(price) = form.price.trim().parse::<f64>() else {
        flash(&session, "Invalid price.").await;
        return Ok(Redirect::to("/add_product"));
    };
    let Ok(inventory) = form.inventory.trim().parse::<i32>() else {
        flash(&session, "Invalid inventory.").await;
        return Ok(Redirect::to("/add_product"));
    };

    let id = state
        .store
        .add_product(NewProduct {
            name,
            price,
            inventory,
            category: non_empty(form.category),
            image_url: non_empty(form.image_url),
        })
        .await?;

    info!("Admin added product {}", id);
    flash(&session, "Product added.").await;
    Ok(Redirect::to("/admin_products"))
}

/// GET /admin/product/edit/{id}
pub async fn edit_product_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Response, WebError> {
    let Some(product) = state.store.get_product(id).await? else {
        return Ok((StatusCode::NOT_FOUND, "Product not found").into_response());
    };

    Ok(EditProductTemplate {
        page: PageContext::build(&state, &session).await,
        product: ProductView::from(product),
    }
    .into_response())
}

/// POST /admin/product/edit/{id}
///
/// Bad numeric input degrades instead of failing the whole edit: an
/// unparseable price keeps the stored value, an unparseable inventory
/// is set to zero. Both cases warn via flash.
pub async fn edit_product(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<ProductForm>,
) -> Result<Redirect, WebError> {
    let price = match form.price.trim().parse::<f64>() {
        Ok(p) => Some(p),
        Err(_) => {
            flash(&session, "Invalid price; keeping the existing value.").await;
            None
        }
    };

    let inventory = match form.inventory.trim().parse::<i32>() {
        Ok(v) => v,
        Err(_) => {
            flash(&session, "Invalid inventory; set to 0.").await;
            0
        }
    };

    let update = ProductUpdate {
        name: Some(form.name.trim().to_string()),
        price,
        inventory: Some(inventory),
        category: non_empty(form.category),
        image_url: non_empty(form.image_url),
    };

    let updated = state.store.update_product(id, update).await?;
    if !updated {
        flash(&session, "Product not found.").await;
        return Ok(Redirect::to("/admin_products"));
    }

    info!("Admin updated product {}", id);
    flash(&session, "Product updated.").await;
    Ok(Redirect::to("/admin_products"))
}

/// POST /admin/product/delete/{id}
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect, WebError> {
    let removed = state.store.remove_product(id).await?;
    if removed {
        info!("Admin deleted product {}", id);
        flash(&session, "Product deleted.").await;
    } else {
        flash(&session, "Product not found.").await;
    }

    Ok(Redirect::to("/admin_products"))
}
