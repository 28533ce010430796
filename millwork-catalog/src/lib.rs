pub mod product;
pub mod pricing;
pub mod preset;

pub use product::{Catalog, Category, Dimensions, Material, Product, ProductError, ProductSelection};
pub use pricing::{
    calculate_displayed_price, evaluate_formula, extract_displayed_price, FormulaStep, OperandType, Operator, PricingRule,
    PricingRuleSource, RuleError, VariableBag,
};
pub use preset::PresetValues;
