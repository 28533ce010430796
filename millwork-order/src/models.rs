use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::quote::{AdjustmentType, ClientInfo, Quote, QuoteStatus};
use crate::manager::OrderError;

/// Order status in the production lifecycle
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    #[default]
    Draft,
    Sent,
}

/// A partial-payment receipt issued against an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Uuid,
    pub order_id: Uuid,
    /// Share of the order total this receipt covers, `0 < pct <= 100`
    pub payment_percentage: f64,
    pub amount: f64,
    pub status: ReceiptStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Receipt {
    pub fn new(order_id: Uuid, payment_percentage: f64, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            payment_percentage,
            amount,
            status: ReceiptStatus::Draft,
            sent_at: None,
            created_at: Utc::now(),
        }
    }

    /// Mark as delivered to the client
    pub fn send(&mut self) {
        self.status = ReceiptStatus::Sent;
        self.sent_at = Some(Utc::now());
    }
}

/// A confirmed job, created from an approved quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub quote_id: Option<Uuid>,
    #[serde(flatten)]
    pub client: ClientInfo,
    pub status: OrderStatus,
    pub total: f64,
    pub adjustment_type: Option<AdjustmentType>,
    pub adjustment_percentage: Option<f64>,
    pub adjusted_total: Option<f64>,
    #[serde(default)]
    pub receipts: Vec<Receipt>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

impl Order {
    /// Convert an approved quote. Totals are recomputed from the quote lines.
    pub fn from_quote(quote: &Quote) -> Result<Self, OrderError> {
        if quote.status != QuoteStatus::Approved {
            return Err(OrderError::QuoteNotApproved(quote.id));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            quote_id: Some(quote.id),
            client: quote.client.clone(),
            status: OrderStatus::Pending,
            total: quote.subtotal(),
            adjustment_type: quote.adjustment_type,
            adjustment_percentage: quote.adjustment_percentage,
            adjusted_total: quote.adjustment_type.map(|_| quote.adjusted_total()),
            receipts: Vec::new(),
            created_at: now,
            updated_at: now,
            created_by: quote.created_by,
        })
    }

    /// Amount the client owes in total: the adjusted total when an adjustment
    /// applies, otherwise the plain total.
    pub fn effective_total(&self) -> f64 {
        self.adjusted_total.unwrap_or(self.total)
    }

    /// Sum of all receipts issued so far, drafts included
    pub fn amount_receipted(&self) -> f64 {
        self.receipts.iter().map(|r| r.amount).sum()
    }

    pub fn update_status(&mut self, new_status: OrderStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }

    pub fn receipt_mut(&mut self, receipt_id: Uuid) -> Option<&mut Receipt> {
        self.receipts.iter_mut().find(|r| r.id == receipt_id)
    }
}
