use crate::manager::OrderError;
use crate::models::{Order, OrderStatus, Receipt, ReceiptStatus};
use uuid::Uuid;

/// Tolerance when comparing a new receipt against the outstanding balance
const CENT_EPSILON: f64 = 0.005;

/// Handles receipts and balances for orders
pub struct FinancialManager;

impl FinancialManager {
    pub fn new() -> Self {
        Self
    }

    /// Amount still owed once every issued receipt is paid
    pub fn balance_due(&self, order: &Order) -> f64 {
        round_cents(order.effective_total() - order.amount_receipted())
    }

    /// Issue a draft receipt for `payment_percentage` of the order total.
    pub fn issue_receipt(&self, order: &mut Order, payment_percentage: f64) -> Result<Receipt, OrderError> {
        if order.status == OrderStatus::Cancelled {
            return Err(OrderError::OrderCancelled);
        }
        if !(payment_percentage.is_finite() && payment_percentage > 0.0 && payment_percentage <= 100.0) {
            return Err(OrderError::InvalidPaymentPercentage(payment_percentage));
        }

        let amount = round_cents(order.effective_total() * payment_percentage / 100.0);
        let balance = self.balance_due(order);
        if amount > balance + CENT_EPSILON {
            return Err(OrderError::ExceedsBalance { amount, balance });
        }

        let receipt = Receipt::new(order.id, payment_percentage, amount);
        tracing::info!(
            order_id = %order.id,
            receipt_id = %receipt.id,
            payment_percentage,
            amount,
            "Receipt issued"
        );

        order.receipts.push(receipt.clone());
        Ok(receipt)
    }

    /// Mark a draft receipt as sent to the client
    pub fn mark_sent(&self, order: &mut Order, receipt_id: Uuid) -> Result<Receipt, OrderError> {
        let receipt = order
            .receipt_mut(receipt_id)
            .ok_or(OrderError::ReceiptNotFound(receipt_id))?;

        if receipt.status == ReceiptStatus::Sent {
            return Err(OrderError::ReceiptAlreadySent(receipt_id));
        }

        receipt.send();
        Ok(receipt.clone())
    }

    /// Remove a receipt that has not been sent yet
    pub fn delete_receipt(&self, order: &mut Order, receipt_id: Uuid) -> Result<Receipt, OrderError> {
        let idx = order
            .receipts
            .iter()
            .position(|r| r.id == receipt_id)
            .ok_or(OrderError::ReceiptNotFound(receipt_id))?;

        if order.receipts[idx].status == ReceiptStatus::Sent {
            return Err(OrderError::ReceiptAlreadySent(receipt_id));
        }

        Ok(order.receipts.remove(idx))
    }
}

impl Default for FinancialManager {
    fn default() -> Self {
        Self::new()
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
