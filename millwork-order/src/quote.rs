use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};

use millwork_catalog::{Dimensions, Product, PricingRuleSource};

/// Quote status in the sales pipeline
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[default]
    Draft,
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentType {
    Discount,
    Surcharge,
}

/// Client and project details shared by quotes and the orders made from them
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientInfo {
    pub client_name: String,
    pub email: String,
    pub phone: String,
    pub project_name: String,
    pub installation_address: String,
}

/// One cabinet line inside a space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CabinetItem {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub material_id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    #[serde(default)]
    pub quantity: Option<u32>,
    /// Displayed price at the time the line was priced
    #[serde(default)]
    pub price: f64,
    pub unit_price: Option<f64>,
    pub total_price: Option<f64>,
    #[serde(default)]
    pub sort_order: i32,
    pub notes: Option<String>,
}

impl CabinetItem {
    pub fn new(width: f64, height: f64, depth: f64, price: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: None,
            material_id: None,
            name: None,
            width,
            height,
            depth,
            quantity: None,
            price,
            unit_price: None,
            total_price: None,
            sort_order: 0,
            notes: None,
        }
    }

    /// New line for `product`, priced with the current rules and pre-filled
    /// with the product's default material.
    pub fn from_product<S>(product: &Product, dimensions: Dimensions, rules: &S) -> Self
    where
        S: PricingRuleSource + ?Sized,
    {
        let price = product.price_for(&dimensions, rules);
        Self {
            product_id: Some(product.id),
            material_id: product.default_material().map(|m| m.id),
            name: Some(product.name.clone()),
            unit_price: Some(price),
            ..Self::new(dimensions.width, dimensions.height, dimensions.depth, price)
        }
    }

    pub fn quantity(&self) -> u32 {
        self.quantity.filter(|q| *q > 0).unwrap_or(1)
    }

    /// Quantity times unit price; a missing or zero unit price falls back to
    /// the displayed price.
    pub fn line_total(&self) -> f64 {
        let unit = self.unit_price.filter(|p| *p != 0.0).unwrap_or(self.price);
        self.quantity() as f64 * unit
    }
}

/// A room or area of the project grouping cabinet lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub items: Vec<CabinetItem>,
    pub dimensions: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

impl Space {
    pub fn new(name: impl Into<String>, items: Vec<CabinetItem>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            items,
            dimensions: None,
            notes: None,
            sort_order: 0,
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(CabinetItem::line_total).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(flatten)]
    pub client: ClientInfo,
    #[serde(default)]
    pub spaces: Vec<Space>,
    #[serde(default)]
    pub status: QuoteStatus,
    #[serde(default)]
    pub total: f64,
    pub adjustment_type: Option<AdjustmentType>,
    pub adjustment_percentage: Option<f64>,
    pub adjusted_total: Option<f64>,
    pub notes: Option<String>,
    pub valid_until: Option<NaiveDate>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

impl Quote {
    pub fn new(client: ClientInfo) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client,
            spaces: Vec::new(),
            status: QuoteStatus::Draft,
            total: 0.0,
            adjustment_type: None,
            adjustment_percentage: None,
            adjusted_total: None,
            notes: None,
            valid_until: None,
            created_at: now,
            updated_at: now,
            created_by: None,
        }
    }

    pub fn add_space(&mut self, space: Space) {
        self.spaces.push(space);
        self.recalculate();
    }

    /// Sum of every line in every space
    pub fn subtotal(&self) -> f64 {
        self.spaces.iter().map(Space::subtotal).sum()
    }

    /// Subtotal after the discount or surcharge, if any
    pub fn adjusted_total(&self) -> f64 {
        let subtotal = self.subtotal();
        let pct = self.adjustment_percentage.unwrap_or(0.0) / 100.0;
        match self.adjustment_type {
            Some(AdjustmentType::Discount) => subtotal * (1.0 - pct),
            Some(AdjustmentType::Surcharge) => subtotal * (1.0 + pct),
            None => subtotal,
        }
    }

    pub fn set_adjustment(&mut self, kind: AdjustmentType, percentage: f64) {
        self.adjustment_type = Some(kind);
        self.adjustment_percentage = Some(percentage);
        self.recalculate();
    }

    pub fn clear_adjustment(&mut self) {
        self.adjustment_type = None;
        self.adjustment_percentage = None;
        self.recalculate();
    }

    /// Refresh the stored `total` and `adjusted_total` from the lines.
    pub fn recalculate(&mut self) {
        self.total = self.subtotal();
        self.adjusted_total = self.adjustment_type.map(|_| self.adjusted_total());
        self.updated_at = Utc::now();
    }

    pub fn update_status(&mut self, status: QuoteStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Copy of this quote as a new draft, with fresh ids throughout.
    pub fn duplicate(&self) -> Self {
        let now = Utc::now();
        let spaces = self
            .spaces
            .iter()
            .map(|space| Space {
                id: Uuid::new_v4(),
                items: space
                    .items
                    .iter()
                    .map(|item| CabinetItem { id: Uuid::new_v4(), ..item.clone() })
                    .collect(),
                ..space.clone()
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            client: ClientInfo {
                client_name: format!("{} (Copy)", self.client.client_name),
                project_name: format!("{} (Copy)", self.client.project_name),
                ..self.client.clone()
            },
            spaces,
            status: QuoteStatus::Draft,
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }
}

/// Figures shown at the foot of a quote
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QuoteTotals {
    pub subtotal: f64,
    /// Signed: negative for a discount
    pub adjustment: f64,
    pub adjusted_subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

impl QuoteTotals {
    pub fn compute(quote: &Quote, tax_fraction: f64) -> Self {
        let subtotal = quote.subtotal();
        let adjusted_subtotal = quote.adjusted_total();
        let tax = adjusted_subtotal * tax_fraction;

        Self {
            subtotal,
            adjustment: adjusted_subtotal - subtotal,
            adjusted_subtotal,
            tax,
            total: adjusted_subtotal + tax,
        }
    }
}
