use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::info;

use super::{PageContext, WebError, cart::CartLineView, catalog::ProductView, flash};
use crate::api::AppState;
use crate::db::User;
use crate::services::CheckoutError;

#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub publishable_key: String,
    /// Set after a completed charge; switches the page to the order
    /// confirmation view.
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub payment_token: Option<String>,
}

/// GET /checkout
pub async fn checkout_page(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    session: Session,
) -> Result<CheckoutTemplate, WebError> {
    let summary = state.checkout.gather(user.id).await?;

    Ok(CheckoutTemplate {
        page: PageContext::build(&state, &session).await,
        lines: summary
            .lines
            .into_iter()
            .map(|l| CartLineView {
                item_id: l.item.id,
                product: ProductView::from(l.product),
            })
            .collect(),
        total: format!("{:.2}", summary.total),
        publishable_key: state.config.payments.publishable_key.clone(),
        success: false,
    })
}

/// POST /checkout
///
/// Captures payment first; the cart and inventory are only touched after
/// a successful charge. A completed charge renders the confirmation view
/// with the items and total that were billed.
pub async fn submit_checkout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, WebError> {
    match state
        .checkout
        .submit(user.id, form.payment_token.as_deref())
        .await
    {
        Ok(summary) => {
            info!(
                "Checkout completed for user {} ({} items)",
                user.username,
                summary.lines.len()
            );
            let total = format!("{:.2}", summary.total);
            Ok(CheckoutTemplate {
                page: PageContext::build(&state, &session).await,
                lines: summary
                    .lines
                    .into_iter()
                    .map(|l| CartLineView {
                        item_id: l.item.id,
                        product: ProductView::from(l.product),
                    })
                    .collect(),
                total,
                publishable_key: state.config.payments.publishable_key.clone(),
                success: true,
            }
            .into_response())
        }
        Err(CheckoutError::MissingPaymentToken) => {
            flash(&session, "Payment token missing.").await;
            Ok(Redirect::to("/checkout").into_response())
        }
        Err(CheckoutError::PaymentDeclined(_)) => {
            flash(&session, "Your card was declined.").await;
            Ok(Redirect::to("/checkout").into_response())
        }
        Err(CheckoutError::PaymentProcessing(msg)) => {
            flash(&session, format!("Payment error: {msg}")).await;
            Ok(Redirect::to("/checkout").into_response())
        }
        Err(CheckoutError::Internal(e)) => Err(e.into()),
    }
}
