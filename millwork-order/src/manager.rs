use crate::models::{Order, OrderStatus};
use crate::quote::Quote;
use uuid::Uuid;
use std::collections::HashMap;

/// Manages order lifecycle and state transitions
pub struct OrderManager {
    orders: HashMap<Uuid, Order>,
}

impl OrderManager {
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
        }
    }

    /// Create a new order from an approved quote
    pub fn create_from_quote(&mut self, quote: &Quote) -> Result<Order, OrderError> {
        let order = Order::from_quote(quote)?;
        tracing::info!(order_id = %order.id, quote_id = %quote.id, "Order created from quote");

        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    /// Get an order by ID
    pub fn get_order(&self, order_id: &Uuid) -> Option<&Order> {
        self.orders.get(order_id)
    }

    /// All orders, newest first
    pub fn list_orders(&self) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self.orders.values().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Move an order along its lifecycle.
    ///
    /// Pending → InProgress → Completed; Pending or InProgress → Cancelled.
    /// Setting the current status again is a no-op.
    pub fn update_status(&mut self, order_id: &Uuid, new_status: OrderStatus) -> Result<(), OrderError> {
        let order = self.get_order_mut(order_id)?;

        if order.status == new_status {
            return Ok(());
        }
        if !is_valid_transition(order.status, new_status) {
            return Err(OrderError::InvalidTransition {
                from: format!("{:?}", order.status),
                to: format!("{:?}", new_status),
            });
        }

        tracing::info!(%order_id, from = ?order.status, to = ?new_status, "Order status changed");
        order.update_status(new_status);
        Ok(())
    }

    pub fn delete_order(&mut self, order_id: &Uuid) -> Result<Order, OrderError> {
        self.orders
            .remove(order_id)
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))
    }

    /// Helper to get mutable order reference
    pub fn get_order_mut(&mut self, order_id: &Uuid) -> Result<&mut Order, OrderError> {
        self.orders.get_mut(order_id)
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))
    }
}

impl Default for OrderManager {
    fn default() -> Self {
        Self::new()
    }
}

fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Pending, InProgress) | (InProgress, Completed) | (Pending, Cancelled) | (InProgress, Cancelled)
    )
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: String,
        to: String,
    },

    #[error("Quote {0} is not approved")]
    QuoteNotApproved(Uuid),

    #[error("Payment percentage must be greater than 0 and at most 100, got {0}")]
    InvalidPaymentPercentage(f64),

    #[error("Receipt of {amount:.2} exceeds the outstanding balance of {balance:.2}")]
    ExceedsBalance { amount: f64, balance: f64 },

    #[error("Cannot issue receipts for a cancelled order")]
    OrderCancelled,

    #[error("Receipt not found: {0}")]
    ReceiptNotFound(Uuid),

    #[error("Receipt {0} was already sent")]
    ReceiptAlreadySent(Uuid),
}
