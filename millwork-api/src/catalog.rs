use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use millwork_catalog::{Catalog, Dimensions, Product, ProductError, ProductSelection, PricingRuleSource};
use millwork_core::Permission;
use millwork_order::CabinetItem;

use crate::{error::AppError, middleware::auth::UserClaims, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProductPriceRequest {
    pub product_id: Uuid,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

#[derive(Debug, Serialize)]
pub struct ProductPriceResponse {
    pub selection: ProductSelection,
    /// Quote line pre-filled from the product
    pub item: CabinetItem,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/catalog", get(get_catalog).put(replace_catalog))
        .route("/v1/catalog/categories/{id}/products", get(list_category_products))
        .route("/v1/catalog/price", post(price_product))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/catalog
async fn get_catalog(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Result<Json<Catalog>, AppError> {
    claims.require(Permission::ViewCatalog)?;
    Ok(Json(state.catalog.read().await.clone()))
}

/// PUT /v1/catalog
/// Sync the catalog fetched from the backend
async fn replace_catalog(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Json(catalog): Json<Catalog>,
) -> Result<Json<Catalog>, AppError> {
    claims.require(Permission::ManageSettings)?;

    *state.catalog.write().await = catalog.clone();
    tracing::info!(user = %claims.sub, products = catalog.products.len(), "Catalog replaced");
    Ok(Json(catalog))
}

/// GET /v1/catalog/categories/{id}/products
async fn list_category_products(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path(category_id): Path<Uuid>,
) -> Result<Json<Vec<Product>>, AppError> {
    claims.require(Permission::ViewCatalog)?;

    let catalog = state.catalog.read().await;
    Ok(Json(catalog.products_in(category_id).cloned().collect()))
}

/// POST /v1/catalog/price
/// Price a product at the requested dimensions with the live rules
async fn price_product(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Json(req): Json<ProductPriceRequest>,
) -> Result<Json<ProductPriceResponse>, AppError> {
    claims.require(Permission::ViewCatalog)?;

    if [req.width, req.height, req.depth].iter().any(|v| !v.is_finite()) {
        return Err(AppError::ValidationError("Dimensions must be finite numbers".to_string()));
    }
    let dimensions = Dimensions { width: req.width, height: req.height, depth: req.depth };

    let rules = state.rules.pricing_rules();
    let catalog = state.catalog.read().await;
    let selection = catalog.select_product(req.product_id, &dimensions, &rules)?;
    let product = catalog
        .find_product(req.product_id)
        .ok_or(ProductError::NotFound(req.product_id))?;
    let item = CabinetItem::from_product(product, dimensions, &rules);

    Ok(Json(ProductPriceResponse { selection, item }))
}
