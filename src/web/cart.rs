use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Extension,
    extract::{Path, State},
    response::Redirect,
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{PageContext, WebError, catalog::ProductView, flash};
use crate::api::AppState;
use crate::db::{CartError, User};

pub struct CartLineView {
    pub item_id: i32,
    pub product: ProductView,
}

#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub page: PageContext,
    pub lines: Vec<CartLineView>,
    pub total: String,
}

/// GET /cart
pub async fn view_cart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    session: Session,
) -> Result<CartTemplate, WebError> {
    let lines = state.store.list_cart(user.id).await?;
    let total: f64 = lines.iter().map(|l| l.product.price).sum();

    Ok(CartTemplate {
        page: PageContext::build(&state, &session).await,
        lines: lines
            .into_iter()
            .map(|l| CartLineView {
                item_id: l.item.id,
                product: ProductView::from(l.product),
            })
            .collect(),
        total: format!("{:.2}", total),
    })
}

/// GET /add_to_cart/{id}
///
/// One click reserves one unit. The reservation is refused once the
/// user already holds as many units as the product has in stock.
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect, WebError> {
    match state.store.add_to_cart(user.id, id).await {
        Ok(_) => {
            flash(&session, "Added to cart.").await;
            Ok(Redirect::to("/cart"))
        }
        Err(CartError::ProductNotFound(_)) => {
            flash(&session, "Product not found.").await;
            Ok(Redirect::to("/"))
        }
        Err(CartError::InsufficientInventory) => {
            flash(&session, "Item is out of stock.").await;
            Ok(Redirect::to(&format!("/product/{id}")))
        }
        Err(CartError::Database(e)) => Err(e.into()),
    }
}

/// POST /remove_from_cart/{id}
///
/// The delete is scoped to the caller's own rows; ids belonging to other
/// users are silently ignored.
pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect, WebError> {
    state.store.remove_from_cart(user.id, id).await?;
    flash(&session, "Item removed from cart.").await;
    Ok(Redirect::to("/cart"))
}
