use serde::{Deserialize, Serialize};

use millwork_core::{CoreError, CoreResult};

/// Shop-wide preset values edited from the settings screen. Percentages are
/// stored as `0..=100`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresetValues {
    pub default_height: f64,
    pub default_width: f64,
    pub default_depth: f64,
    pub labor_rate: f64,
    pub material_markup: f64,
    pub tax_rate: f64,
    pub delivery_fee: f64,
    pub installation_fee: f64,
    pub storage_fee: f64,
    pub minimum_order: f64,
    pub rush_order_fee: f64,
    pub shipping_rate: f64,
    pub import_tax_rate: f64,
    pub exchange_rate: f64,
}

impl Default for PresetValues {
    fn default() -> Self {
        Self {
            default_height: 34.5,
            default_width: 30.0,
            default_depth: 24.0,
            labor_rate: 45.0,
            material_markup: 30.0,
            tax_rate: 16.0,
            delivery_fee: 0.0,
            installation_fee: 0.0,
            storage_fee: 25.0,
            minimum_order: 0.0,
            rush_order_fee: 0.0,
            shipping_rate: 2.5,
            import_tax_rate: 5.0,
            exchange_rate: 1.0,
        }
    }
}

impl PresetValues {
    pub fn validate(&self) -> CoreResult<()> {
        let positive = [
            ("default_height", self.default_height),
            ("default_width", self.default_width),
            ("default_depth", self.default_depth),
            ("labor_rate", self.labor_rate),
            ("exchange_rate", self.exchange_rate),
        ];
        let percentages = [
            ("material_markup", self.material_markup),
            ("tax_rate", self.tax_rate),
            ("rush_order_fee", self.rush_order_fee),
            ("import_tax_rate", self.import_tax_rate),
        ];
        let non_negative = [
            ("delivery_fee", self.delivery_fee),
            ("installation_fee", self.installation_fee),
            ("storage_fee", self.storage_fee),
            ("minimum_order", self.minimum_order),
            ("shipping_rate", self.shipping_rate),
        ];

        let mut problems = Vec::new();
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                problems.push(format!("{} must be positive", field));
            }
        }
        for (field, value) in percentages {
            if !(0.0..=100.0).contains(&value) {
                problems.push(format!("{} must be between 0 and 100", field));
            }
        }
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                problems.push(format!("{} cannot be negative", field));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CoreError::ValidationError(problems.join("; ")))
        }
    }

    /// Tax rate as a multiplier (16 -> 0.16)
    pub fn tax_fraction(&self) -> f64 {
        self.tax_rate / 100.0
    }
}
