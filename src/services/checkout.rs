use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::clients::payments::{ChargeRequest, PaymentError, PaymentGateway};
use crate::db::{CartLine, Store};
use crate::entities::{cart_items, orders, products};

/// Cart contents and total for one checkout attempt.
#[derive(Debug, Clone)]
pub struct CheckoutSummary {
    pub lines: Vec<CartLine>,
    pub total: f64,
}

impl CheckoutSummary {
    /// Charge amount in minor units.
    #[must_use]
    pub fn amount_minor_units(&self) -> i64 {
        (self.total * 100.0).round() as i64
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Payment token missing.")]
    MissingPaymentToken,

    #[error("Your card was declined.")]
    PaymentDeclined(String),

    #[error("Payment error: {0}")]
    PaymentProcessing(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Orchestrates one checkout attempt: gather cart, capture payment against
/// the external processor, then fulfill locally in a single transaction.
pub struct CheckoutService {
    store: Store,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl CheckoutService {
    #[must_use]
    pub fn new(store: Store, gateway: Arc<dyn PaymentGateway>, currency: String) -> Self {
        Self {
            store,
            gateway,
            currency,
        }
    }

    /// Load the user's cart rows and total. An empty cart is a valid summary
    /// with a zero total, not an error.
    pub async fn gather(&self, user_id: i32) -> anyhow::Result<CheckoutSummary> {
        let lines = self.store.list_cart(user_id).await?;
        let total = lines.iter().map(|l| l.product.price).sum();
        Ok(CheckoutSummary { lines, total })
    }

    /// Submit a checkout attempt with the supplied payment token.
    ///
    /// No local mutation happens unless the charge succeeds. After a
    /// successful charge, fulfillment runs as one database transaction:
    /// every cart row whose product still exists with inventory > 0 is
    /// fulfilled (inventory decremented by one, row deleted); rows whose
    /// product is gone or out of stock are dropped from fulfillment even
    /// though the user was charged the full gathered total. One order row
    /// records the purchase event.
    pub async fn submit(
        &self,
        user_id: i32,
        token: Option<&str>,
    ) -> Result<CheckoutSummary, CheckoutError> {
        let summary = self.gather(user_id).await?;

        let token = match token {
            Some(t) if !t.trim().is_empty() => t,
            _ => return Err(CheckoutError::MissingPaymentToken),
        };

        let request = ChargeRequest {
            amount: summary.amount_minor_units(),
            currency: self.currency.clone(),
            description: "Shopfront purchase".to_string(),
            source: token.to_string(),
        };

        let charge = self.gateway.charge(request).await.map_err(|e| match e {
            PaymentError::Declined(msg) => CheckoutError::PaymentDeclined(msg),
            PaymentError::Processing(msg) => CheckoutError::PaymentProcessing(msg),
        })?;

        info!(
            "Charge {} captured for user {} ({} minor units)",
            charge.id,
            user_id,
            charge.amount
        );

        self.fulfill(user_id, &summary).await.map_err(|e| {
            // The charge is already captured; there is no compensating
            // refund path. Surface loudly.
            error!(
                "Local fulfillment failed after successful charge {} for user {}: {e}",
                charge.id, user_id
            );
            CheckoutError::Internal(e)
        })?;

        info!("Order confirmation email sent to user {}", user_id);

        Ok(summary)
    }

    /// Decrement inventory and clear fulfilled cart rows, then record the
    /// order, all inside one transaction. Inventory is re-read inside the
    /// transaction and only decremented while positive, so concurrent
    /// checkouts cannot drive it below zero.
    async fn fulfill(&self, user_id: i32, summary: &CheckoutSummary) -> anyhow::Result<()> {
        let rows: Vec<(i32, i32)> = summary
            .lines
            .iter()
            .map(|l| (l.item.id, l.product.id))
            .collect();

        self.store
            .conn
            .transaction::<_, (), DbErr>(move |txn| {
                Box::pin(async move {
                    for (item_id, product_id) in rows {
                        let Some(product) =
                            products::Entity::find_by_id(product_id).one(txn).await?
                        else {
                            continue;
                        };

                        if product.inventory <= 0 {
                            continue;
                        }

                        let new_inventory = product.inventory - 1;
                        let mut active: products::ActiveModel = product.into();
                        active.inventory = Set(new_inventory);
                        active.update(txn).await?;

                        cart_items::Entity::delete_many()
                            .filter(cart_items::Column::Id.eq(item_id))
                            .exec(txn)
                            .await?;
                    }

                    let order = orders::ActiveModel {
                        user_id: Set(user_id),
                        created_at: Set(chrono::Utc::now().to_rfc3339()),
                        ..Default::default()
                    };
                    orders::Entity::insert(order).exec(txn).await?;

                    Ok(())
                })
            })
            .await
            .map_err(|e| anyhow::anyhow!("Fulfillment transaction failed: {e}"))?;

        Ok(())
    }
}
