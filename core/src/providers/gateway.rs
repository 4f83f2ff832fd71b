//! Payment gateway trait.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Order creation request sent to the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    /// Amount in minor currency units (paise, cents)
    pub amount_minor: u64,
    /// ISO currency code
    pub currency: String,
    /// Merchant receipt identifier
    pub receipt: String,
}

/// Order created by the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// Gateway order identifier
    pub order_id: String,
    /// Amount in minor currency units as accepted by the gateway
    pub amount_minor: u64,
}

/// Payment gateway.
///
/// Abstraction over Razorpay-style processors: the merchant creates an order,
/// the client pays against it, and the gateway signs the result with the
/// shared secret.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Gateway`] if the gateway rejects the
    /// request or cannot be reached.
    async fn create_order(&self, request: OrderRequest) -> Result<GatewayOrder>;
}
