use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::PaymentConfig;

/// A single charge to be captured by the external processor.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    /// Amount in minor units (e.g. cents).
    pub amount: i64,

    /// ISO currency code.
    pub currency: String,

    pub description: String,

    /// Opaque tokenized payment instrument supplied by the client.
    pub source: String,
}

/// Successful charge as reported by the processor.
#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    pub id: String,

    pub amount: i64,

    pub currency: String,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    /// The processor rejected the instrument (card declined).
    #[error("{0}")]
    Declined(String),

    /// Transport failure or any other processor-side error.
    #[error("{0}")]
    Processing(String),
}

/// Seam for the external payment processor, so checkout can be exercised
/// without network access in tests.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: ChargeRequest) -> Result<Charge, PaymentError>;
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: Option<String>,

    message: Option<String>,
}

/// Stripe-compatible charges client.
pub struct StripeGateway {
    client: Client,
    config: PaymentConfig,
}

impl StripeGateway {
    #[must_use]
    pub fn new(config: PaymentConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.request_timeout_seconds)))
            .build()
            .unwrap_or_default();

        Self { client, config }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn charge(&self, request: ChargeRequest) -> Result<Charge, PaymentError> {
        let url = format!("{}/v1/charges", self.config.base_url.trim_end_matches('/'));

        let amount = request.amount.to_string();
        let params = [
            ("amount", amount.as_str()),
            ("currency", request.currency.as_str()),
            ("description", request.description.as_str()),
            ("source", request.source.as_str()),
        ];

        debug!(
            "Creating charge of {} {} at {}",
            request.amount, request.currency, url
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::Processing(format!("Payment request failed: {e}")))?;

        let status = response.status();

        if status.is_success() {
            let charge: Charge = response
                .json()
                .await
                .map_err(|e| PaymentError::Processing(format!("Invalid charge response: {e}")))?;
            return Ok(charge);
        }

        let body: Option<ErrorResponse> = response.json().await.ok();
        let (kind, message) = body
            .map(|b| (b.error.kind, b.error.message))
            .unwrap_or_default();
        let message = message.unwrap_or_else(|| format!("Payment processor returned {status}"));

        if status == reqwest::StatusCode::PAYMENT_REQUIRED || kind.as_deref() == Some("card_error")
        {
            warn!("Charge declined: {}", message);
            return Err(PaymentError::Declined(message));
        }

        warn!("Charge failed ({}): {}", status, message);
        Err(PaymentError::Processing(message))
    }
}
