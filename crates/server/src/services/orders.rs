//! Order lookup and fulfilment administration.

use darkroom_core::{FulfilmentStatus, Order, OrderId, PaymentStatus};
use tracing::{info, instrument};

use super::ServiceError;
use crate::db::{OrderFilter, OrderRepository};

/// Reads orders and moves them through fulfilment.
pub struct OrderService<'a> {
    orders: &'a dyn OrderRepository,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(orders: &'a dyn OrderRepository) -> Self {
        Self { orders }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if there is no such order.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &OrderId) -> Result<Order, ServiceError> {
        self.orders
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {id}")))
    }

    /// Orders matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, ServiceError> {
        Ok(self.orders.list(filter).await?)
    }

    /// Move an order to `next` fulfilment status.
    ///
    /// # Errors
    ///
    /// - `ServiceError::NotFound` if there is no such order
    /// - `ServiceError::Conflict` if the transition is not allowed, if a
    ///   refund is requested for an unpaid order, or if the order changed
    ///   while this update was in flight
    #[instrument(skip(self))]
    pub async fn update_fulfilment(
        &self,
        id: &OrderId,
        next: FulfilmentStatus,
    ) -> Result<Order, ServiceError> {
        let order = self.get(id).await?;
        let current = order.fulfilment_status;
        current.transition(next)?;

        if next == FulfilmentStatus::Refunded && order.payment_status != PaymentStatus::Paid {
            return Err(ServiceError::Conflict(format!(
                "order {id} cannot be refunded while payment is {}",
                order.payment_status
            )));
        }

        if !self.orders.update_fulfilment_status(id, current, next).await? {
            return Err(ServiceError::Conflict(format!(
                "order {id} was modified concurrently"
            )));
        }

        info!(order_id = %id, from = %current, to = %next, "Fulfilment status updated");
        self.get(id).await
    }
}
