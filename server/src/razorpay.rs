//! Razorpay order API client.
//!
//! Only order creation is needed: the client completes checkout with the
//! returned order id, and the signed callback is verified by the core.

use crate::config::PaymentConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use showtime_core::providers::{GatewayOrder, OrderRequest, PaymentGateway};
use showtime_core::{BookingError, Result};
use std::time::Duration;

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    amount: u64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    amount: u64,
}

/// [`PaymentGateway`] backed by the Razorpay REST API.
#[derive(Clone)]
pub struct RazorpayGateway {
    /// HTTP client for making requests.
    http_client: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    /// Create a client for the configured account.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Internal`] if the HTTP client cannot be built.
    pub fn new(config: &PaymentConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| BookingError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key_id: config.api_key.clone(),
            key_secret: config.api_secret.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, request: OrderRequest) -> Result<GatewayOrder> {
        let body = CreateOrderBody {
            amount: request.amount_minor,
            currency: &request.currency,
            receipt: &request.receipt,
        };

        let response = self
            .http_client
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| BookingError::Gateway(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %error_body, "Razorpay order creation failed");
            return Err(BookingError::Gateway(format!(
                "order creation failed with status {status}"
            )));
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| BookingError::Gateway(e.to_string()))?;

        Ok(GatewayOrder {
            order_id: order.id,
            amount_minor: order.amount,
        })
    }
}
