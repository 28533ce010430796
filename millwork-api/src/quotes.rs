use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::Serialize;
use uuid::Uuid;

use millwork_core::Permission;
use millwork_order::{validate_quote, Quote, QuoteTotals};

use crate::{error::AppError, middleware::auth::UserClaims, state::AppState};

#[derive(Debug, Serialize)]
pub struct QuoteSummaryResponse {
    pub quote_id: Uuid,
    pub totals: QuoteTotals,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/quotes/summary", post(summarize_quote))
        .route("/v1/quotes/duplicate", post(duplicate_quote))
}

/// POST /v1/quotes/summary
/// Validate a quote and compute the figures shown at its foot.
async fn summarize_quote(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Json(quote): Json<Quote>,
) -> Result<Json<QuoteSummaryResponse>, AppError> {
    claims.require(Permission::ManageQuotes)?;
    validate_quote(&quote)?;

    let tax_fraction = state.presets.read().await.tax_fraction();
    Ok(Json(QuoteSummaryResponse {
        quote_id: quote.id,
        totals: QuoteTotals::compute(&quote, tax_fraction),
    }))
}

/// POST /v1/quotes/duplicate
async fn duplicate_quote(
    Extension(claims): Extension<UserClaims>,
    Json(quote): Json<Quote>,
) -> Result<Json<Quote>, AppError> {
    claims.require(Permission::ManageQuotes)?;
    Ok(Json(quote.duplicate()))
}
