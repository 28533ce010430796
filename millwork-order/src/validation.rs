//! Field-level checks run before a quote, space or line is saved. Every
//! problem is collected so the form can show them all at once.

use serde::Serialize;

use crate::quote::{CabinetItem, ClientInfo, Quote, Space};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path to the offending field, e.g. `spaces.0.items.1.width`
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.path, i.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Default)]
struct Issues {
    issues: Vec<ValidationIssue>,
}

impl Issues {
    fn push(&mut self, path: String, message: &str) {
        self.issues.push(ValidationIssue { path, message: message.to_string() });
    }

    fn required(&mut self, path: String, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.push(path, message);
        }
    }

    fn positive(&mut self, path: String, value: f64, message: &str) {
        if !(value.is_finite() && value > 0.0) {
            self.push(path, message);
        }
    }

    fn non_negative(&mut self, path: String, value: f64, message: &str) {
        if !(value.is_finite() && value >= 0.0) {
            self.push(path, message);
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            tracing::debug!(count = self.issues.len(), "Validation failed");
            Err(ValidationError { issues: self.issues })
        }
    }
}

fn join(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

/// Loose shape check: one `@`, something before it, a dotted domain after.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
        }
        None => false,
    }
}

fn check_item(issues: &mut Issues, prefix: &str, item: &CabinetItem) {
    issues.positive(join(prefix, "width"), item.width, "Width must be greater than 0");
    issues.positive(join(prefix, "height"), item.height, "Height must be greater than 0");
    issues.positive(join(prefix, "depth"), item.depth, "Depth must be greater than 0");
    issues.non_negative(join(prefix, "price"), item.price, "Price cannot be negative");
    if let Some(unit_price) = item.unit_price {
        issues.non_negative(join(prefix, "unit_price"), unit_price, "Unit price cannot be negative");
    }
    if let Some(total_price) = item.total_price {
        issues.non_negative(join(prefix, "total_price"), total_price, "Total price cannot be negative");
    }
    if item.quantity == Some(0) {
        issues.push(join(prefix, "quantity"), "Quantity must be positive");
    }
}

fn check_space(issues: &mut Issues, prefix: &str, space: &Space) {
    issues.required(join(prefix, "name"), &space.name, "Space name is required");
    for (idx, item) in space.items.iter().enumerate() {
        check_item(issues, &join(prefix, &format!("items.{}", idx)), item);
    }
}

fn check_client(issues: &mut Issues, client: &ClientInfo) {
    issues.required("client_name".into(), &client.client_name, "Client name is required");
    if !is_valid_email(&client.email) {
        issues.push("email".into(), "Invalid email address");
    }
    issues.required("phone".into(), &client.phone, "Phone number is required");
    issues.required("project_name".into(), &client.project_name, "Project name is required");
    issues.required(
        "installation_address".into(),
        &client.installation_address,
        "Installation address is required",
    );
}

pub fn validate_item(item: &CabinetItem) -> Result<(), ValidationError> {
    let mut issues = Issues::default();
    check_item(&mut issues, "", item);
    issues.finish()
}

pub fn validate_space(space: &Space) -> Result<(), ValidationError> {
    let mut issues = Issues::default();
    check_space(&mut issues, "", space);
    issues.finish()
}

pub fn validate_client(client: &ClientInfo) -> Result<(), ValidationError> {
    let mut issues = Issues::default();
    check_client(&mut issues, client);
    issues.finish()
}

/// Full check of a quote before it is submitted
pub fn validate_quote(quote: &Quote) -> Result<(), ValidationError> {
    let mut issues = Issues::default();
    check_client(&mut issues, &quote.client);

    if quote.spaces.is_empty() {
        issues.push("spaces".into(), "At least one space is required");
    }
    for (idx, space) in quote.spaces.iter().enumerate() {
        check_space(&mut issues, &format!("spaces.{}", idx), space);
    }

    issues.non_negative("total".into(), quote.total, "Total cannot be negative");
    if let Some(pct) = quote.adjustment_percentage {
        if !(0.0..=100.0).contains(&pct) {
            issues.push(
                "adjustment_percentage".into(),
                "Adjustment percentage must be between 0 and 100",
            );
        }
    }
    if let Some(adjusted) = quote.adjusted_total {
        issues.non_negative("adjusted_total".into(), adjusted, "Adjusted total cannot be negative");
    }

    issues.finish()
}
