use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use millwork_catalog::{evaluate_formula, extract_displayed_price, PricingRule, PricingRuleSource, VariableBag};
use millwork_core::Permission;

use crate::{error::AppError, middleware::auth::UserClaims, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PriceRequest {
    pub base_price: f64,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub displayed_price: f64,
    /// Every value the rules could see or produced
    pub values: VariableBag,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/pricing/price", post(calculate_price))
        .route("/v1/pricing/rules", get(list_rules).put(replace_rules))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/pricing/price
async fn calculate_price(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Json(req): Json<PriceRequest>,
) -> Result<Json<PriceResponse>, AppError> {
    claims.require(Permission::ViewCatalog)?;

    let inputs = [req.base_price, req.width, req.height, req.depth];
    if inputs.iter().any(|v| !v.is_finite()) {
        return Err(AppError::ValidationError("Price inputs must be finite numbers".to_string()));
    }

    let rules = state.rules.pricing_rules();
    let values = evaluate_formula(req.base_price, req.width, req.height, req.depth, &rules);
    let displayed_price = extract_displayed_price(&values, req.base_price);

    Ok(Json(PriceResponse { displayed_price, values }))
}

/// GET /v1/pricing/rules
async fn list_rules(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Result<Json<Vec<PricingRule>>, AppError> {
    claims.require(Permission::ViewCatalog)?;
    Ok(Json(state.rules.pricing_rules()))
}

/// PUT /v1/pricing/rules
/// Replace the ordered rule list; invalid rules are rejected as a whole.
async fn replace_rules(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Json(rules): Json<Vec<PricingRule>>,
) -> Result<Json<Vec<PricingRule>>, AppError> {
    claims.require(Permission::ManageSettings)?;

    {
        let _guard = state.rules_write.lock().await;
        state.rule_repo.save_rules(&rules).await?;
        state.rules.replace(rules.clone());
    }
    tracing::info!(user = %claims.sub, count = rules.len(), "Pricing rules replaced");

    Ok(Json(rules))
}
