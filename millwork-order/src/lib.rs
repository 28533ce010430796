pub mod quote;
pub mod validation;
pub mod models;
pub mod manager;
pub mod finance;

pub use quote::{AdjustmentType, CabinetItem, ClientInfo, Quote, QuoteStatus, QuoteTotals, Space};
pub use validation::{validate_quote, ValidationError, ValidationIssue};
pub use models::{Order, OrderStatus, Receipt, ReceiptStatus};
pub use manager::{OrderError, OrderManager};
pub use finance::FinancialManager;
