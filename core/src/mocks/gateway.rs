//! Mock payment gateway.

use crate::error::{BookingError, Result};
use crate::providers::{GatewayOrder, OrderRequest, PaymentGateway};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

/// Gateway that accepts every order and remembers it.
#[derive(Debug, Clone, Default)]
pub struct MockPaymentGateway {
    orders: Arc<Mutex<Vec<OrderRequest>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MockPaymentGateway {
    /// Create a gateway that accepts every order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent orders fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    /// Orders received so far.
    #[must_use]
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_order(&self, request: OrderRequest) -> Result<GatewayOrder> {
        if let Some(message) = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(BookingError::Gateway(message));
        }

        let mut orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);
        orders.push(request.clone());
        let order_id = format!("order_mock_{}", orders.len());

        tracing::info!(
            order_id = %order_id,
            amount_minor = request.amount_minor,
            receipt = %request.receipt,
            "Mock order created"
        );

        Ok(GatewayOrder {
            order_id,
            amount_minor: request.amount_minor,
        })
    }
}
