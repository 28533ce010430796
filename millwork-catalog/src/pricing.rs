use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Constants seeded into every variable bag, after the caller inputs and the
/// derived geometry.
pub const BASE_CONSTANTS: [(&str, f64); 5] = [
    ("material_markup", 1.3),
    ("shipping_rate", 2.5),
    ("import_tax_rate", 0.05),
    ("storage_fee", 25.0),
    ("exchange_rate", 1.0),
];

/// Keys tried in order when reading the final price out of an evaluated bag.
/// When none is present the unadjusted base price is returned.
pub const DISPLAYED_PRICE_KEYS: [&str; 2] = ["displayed_price", "final_price"];

/// Named numeric values visible to pricing rules.
///
/// Missing keys read as `0`. Rule results overwrite existing keys, built-in
/// constants included. Keys are never removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableBag {
    values: BTreeMap<String, f64>,
}

impl VariableBag {
    /// Bag holding the caller inputs, `area`, `volume` and [`BASE_CONSTANTS`].
    pub fn seeded(base_price: f64, width: f64, height: f64, depth: f64) -> Self {
        let mut bag = Self::default();
        bag.set("base_price", base_price);
        bag.set("width", width);
        bag.set("height", height);
        bag.set("depth", depth);
        bag.set("area", width * height);
        bag.set("volume", width * height * depth);
        for (key, value) in BASE_CONSTANTS {
            bag.set(key, value);
        }
        bag
    }

    /// Value stored under `key`; absent keys and NaN read as `0`.
    pub fn get(&self, key: &str) -> f64 {
        self.values
            .get(key)
            .copied()
            .filter(|v| !v.is_nan())
            .unwrap_or(0.0)
    }

    /// Raw lookup that distinguishes an absent key from a stored zero.
    pub fn lookup(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Arithmetic operator of a formula step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    /// Percentage-of: `left * (right / 100)`. Not a modulo.
    #[serde(rename = "%")]
    Percent,
    /// Any operator string the settings UI may have stored that is not one
    /// of the above. Evaluates as a no-op.
    #[serde(other)]
    Unrecognized,
}

impl Operator {
    /// Apply the operator. `None` means the running result is left untouched.
    pub fn apply(self, left: f64, right: f64) -> Option<f64> {
        match self {
            Operator::Add => Some(left + right),
            Operator::Subtract => Some(left - right),
            Operator::Multiply => Some(left * right),
            Operator::Divide if right == 0.0 => Some(0.0),
            Operator::Divide => Some(left / right),
            Operator::Percent => Some(left * (right / 100.0)),
            Operator::Unrecognized => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperandType {
    #[default]
    Literal,
    /// The right operand names a key in the variable bag.
    Factor,
}

/// One binary operation of a rule. Steps after the first take their left
/// value from the previous step's result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormulaStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_operand: Option<String>,
    pub operator: Operator,
    #[serde(deserialize_with = "string_or_number")]
    pub right_operand: String,
    #[serde(default)]
    pub right_operand_type: OperandType,
}

impl FormulaStep {
    pub fn factor(left: Option<&str>, operator: Operator, key: &str) -> Self {
        Self {
            left_operand: left.map(str::to_string),
            operator,
            right_operand: key.to_string(),
            right_operand_type: OperandType::Factor,
        }
    }

    pub fn literal(left: Option<&str>, operator: Operator, value: f64) -> Self {
        Self {
            left_operand: left.map(str::to_string),
            operator,
            right_operand: value.to_string(),
            right_operand_type: OperandType::Literal,
        }
    }

    fn right_value(&self, bag: &VariableBag) -> f64 {
        match self.right_operand_type {
            OperandType::Factor => bag.get(&self.right_operand),
            OperandType::Literal => parse_literal(&self.right_operand).unwrap_or(0.0),
        }
    }
}

/// A named computation whose final value is stored under `result`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub formula: Vec<FormulaStep>,
    pub result: String,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RuleError {
    #[error("Rule has an empty result key")]
    EmptyResultKey,

    #[error("Rule '{0}' has no formula steps")]
    EmptyFormula(String),

    #[error("Rule '{rule}' step {step}: first step needs a left operand")]
    MissingLeftOperand { rule: String, step: usize },

    #[error("Rule '{rule}' step {step}: unrecognized operator")]
    UnrecognizedOperator { rule: String, step: usize },

    #[error("Rule '{rule}' step {step}: '{value}' is not a number")]
    InvalidLiteral { rule: String, step: usize, value: String },
}

impl PricingRule {
    pub fn new(result: impl Into<String>, formula: Vec<FormulaStep>) -> Self {
        Self {
            name: None,
            formula,
            result: result.into(),
        }
    }

    /// Authoring-time check for the settings write path. The evaluator is
    /// lenient and never calls this.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.result.trim().is_empty() {
            return Err(RuleError::EmptyResultKey);
        }
        if self.formula.is_empty() {
            return Err(RuleError::EmptyFormula(self.result.clone()));
        }

        for (idx, step) in self.formula.iter().enumerate() {
            let step_no = idx + 1;
            if idx == 0 && step.left_operand.as_deref().map_or(true, |k| k.trim().is_empty()) {
                return Err(RuleError::MissingLeftOperand { rule: self.result.clone(), step: step_no });
            }
            if step.operator == Operator::Unrecognized {
                return Err(RuleError::UnrecognizedOperator { rule: self.result.clone(), step: step_no });
            }
            if step.right_operand_type == OperandType::Literal && parse_literal(&step.right_operand).is_none() {
                return Err(RuleError::InvalidLiteral {
                    rule: self.result.clone(),
                    step: step_no,
                    value: step.right_operand.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Supplier of the currently configured rules, in execution order
pub trait PricingRuleSource {
    fn pricing_rules(&self) -> Vec<PricingRule>;
}

impl PricingRuleSource for [PricingRule] {
    fn pricing_rules(&self) -> Vec<PricingRule> {
        self.to_vec()
    }
}

impl PricingRuleSource for Vec<PricingRule> {
    fn pricing_rules(&self) -> Vec<PricingRule> {
        self.clone()
    }
}

/// Run `rules` in order against a freshly seeded bag and return the bag.
pub fn evaluate_formula(
    base_price: f64,
    width: f64,
    height: f64,
    depth: f64,
    rules: &[PricingRule],
) -> VariableBag {
    tracing::debug!(base_price, width, height, depth, "Starting formula evaluation");

    let mut bag = VariableBag::seeded(base_price, width, height, depth);

    for (index, rule) in rules.iter().enumerate() {
        let mut result = 0.0;

        for (step_index, step) in rule.formula.iter().enumerate() {
            let left = if step_index == 0 {
                step.left_operand.as_deref().map_or(0.0, |key| bag.get(key))
            } else {
                result
            };
            let right = step.right_value(&bag);

            match step.operator.apply(left, right) {
                Some(value) => result = value,
                None => tracing::warn!(
                    rule = %rule.result,
                    step = step_index + 1,
                    "Unrecognized operator, step skipped"
                ),
            }

            tracing::debug!(
                rule = index + 1,
                step = step_index + 1,
                left,
                operator = ?step.operator,
                right,
                result,
                "Step evaluated"
            );
        }

        bag.set(rule.result.clone(), result);
        tracing::debug!(rule = index + 1, key = %rule.result, value = result, "Rule evaluated");
    }

    bag
}

/// Final price from an evaluated bag: the first present, finite key of
/// [`DISPLAYED_PRICE_KEYS`], else `base_price`.
pub fn extract_displayed_price(bag: &VariableBag, base_price: f64) -> f64 {
    DISPLAYED_PRICE_KEYS
        .iter()
        .filter_map(|key| bag.lookup(key))
        .find(|value| value.is_finite())
        .unwrap_or(base_price)
}

/// Price shown for an item with the given base cost and dimensions under the
/// rules currently supplied by `source`.
pub fn calculate_displayed_price<S>(
    base_price: f64,
    width: f64,
    height: f64,
    depth: f64,
    source: &S,
) -> f64
where
    S: PricingRuleSource + ?Sized,
{
    let rules = source.pricing_rules();
    let bag = evaluate_formula(base_price, width, height, depth, &rules);
    let price = extract_displayed_price(&bag, base_price);

    tracing::debug!(price, rules = rules.len(), "Displayed price calculated");
    price
}

/// Trimmed decimal; empty input is `0`. `None` for text that is not a finite
/// number.
fn parse_literal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
