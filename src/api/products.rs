use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use super::{
    ApiError, AppState, CreateProductRequest, MutationResponse, ProductDto, ProductListResponse,
    UpdateProductRequest, coerce_inventory, coerce_price,
};
use crate::db::{NewProduct, ProductUpdate};

/// GET /api/products
pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let products = state
        .store
        .list_products()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ProductListResponse {
        products: products.into_iter().map(ProductDto::from).collect(),
    }))
}

/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ProductDto>, ApiError> {
    let product = state
        .store
        .get_product(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(ApiError::product_not_found)?;

    Ok(Json(ProductDto::from(product)))
}

/// POST /api/products (admin only)
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<MutationResponse>), ApiError> {
    let Some(name) = body.name.filter(|n| !n.trim().is_empty()) else {
        return Err(ApiError::invalid_input("Missing required fields"));
    };
    let (Some(price_raw), Some(inventory_raw)) = (body.price, body.inventory) else {
        return Err(ApiError::invalid_input("Missing required fields"));
    };

    let price = coerce_price(&price_raw)
        .ok_or_else(|| ApiError::invalid_input("Invalid price or inventory"))?;
    let inventory = coerce_inventory(&inventory_raw)
        .ok_or_else(|| ApiError::invalid_input("Invalid price or inventory"))?;

    let id = state
        .store
        .add_product(NewProduct {
            name,
            price,
            inventory,
            category: body.category,
            image_url: body.image_url,
        })
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::created("Product added", id)),
    ))
}

/// PUT /api/products/{id} (admin only)
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let price = match &body.price {
        Some(raw) => Some(
            coerce_price(raw).ok_or_else(|| ApiError::invalid_input("Invalid price or inventory"))?,
        ),
        None => None,
    };
    let inventory = match &body.inventory {
        Some(raw) => Some(
            coerce_inventory(raw)
                .ok_or_else(|| ApiError::invalid_input("Invalid price or inventory"))?,
        ),
        None => None,
    };

    let update = ProductUpdate {
        name: body.name,
        price,
        inventory,
        category: body.category,
        image_url: body.image_url,
    };

    let updated = state
        .store
        .update_product(id, update)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if !updated {
        return Err(ApiError::product_not_found());
    }

    info!("Product {} updated via API", id);
    Ok(Json(MutationResponse::message("Product updated")))
}

/// DELETE /api/products/{id} (admin only)
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<MutationResponse>, ApiError> {
    let removed = state
        .store
        .remove_product(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if !removed {
        return Err(ApiError::product_not_found());
    }

    info!("Product {} deleted via API", id);
    Ok(Json(MutationResponse::message("Product deleted")))
}
