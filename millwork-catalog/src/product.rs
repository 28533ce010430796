use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing::{calculate_displayed_price, PricingRuleSource};

/// Catalog category (base cabinets, wall cabinets, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub name: String,
    pub unit_cost: Option<f64>,
}

/// Parametric cabinet product. The price is derived from `unit_cost` and the
/// requested dimensions by the configured pricing rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub unit_cost: Option<f64>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool { true }

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Product {
    /// Displayed price for these dimensions. Products without a unit cost
    /// price at zero.
    pub fn price_for<S>(&self, dimensions: &Dimensions, rules: &S) -> f64
    where
        S: PricingRuleSource + ?Sized,
    {
        match self.unit_cost {
            Some(cost) if cost != 0.0 => calculate_displayed_price(
                cost,
                dimensions.width,
                dimensions.height,
                dimensions.depth,
                rules,
            ),
            _ => 0.0,
        }
    }

    /// First listed material, used to pre-fill a new quote line
    pub fn default_material(&self) -> Option<&Material> {
        self.materials.first()
    }
}

/// Product-related errors
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(Uuid),

    #[error("Product not available: {0}")]
    NotAvailable(String),
}

/// Result of picking a product for a quote line
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductSelection {
    pub product_id: Uuid,
    pub price: f64,
    pub material_id: Option<Uuid>,
}

/// In-memory view of the product catalog as fetched from the backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub materials: Vec<Material>,
}

impl Catalog {
    pub fn find_product(&self, id: Uuid) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn products_in(&self, category_id: Uuid) -> impl Iterator<Item = &Product> {
        self.products
            .iter()
            .filter(move |p| p.category_id == Some(category_id))
    }

    /// Price a product for a quote line and suggest its default material.
    pub fn select_product<S>(
        &self,
        product_id: Uuid,
        dimensions: &Dimensions,
        rules: &S,
    ) -> Result<ProductSelection, ProductError>
    where
        S: PricingRuleSource + ?Sized,
    {
        let product = self
            .find_product(product_id)
            .ok_or(ProductError::NotFound(product_id))?;

        if !product.is_active {
            return Err(ProductError::NotAvailable(product.name.clone()));
        }

        let price = product.price_for(dimensions, rules);
        tracing::debug!(%product_id, ?dimensions, price, "Product selected");

        Ok(ProductSelection {
            product_id,
            price,
            material_id: product.default_material().map(|m| m.id),
        })
    }
}
