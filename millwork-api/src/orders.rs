use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use millwork_core::Permission;
use millwork_order::{FinancialManager, Order, OrderStatus, Quote, Receipt};

use crate::{error::AppError, middleware::auth::UserClaims, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub balance_due: f64,
}

impl OrderResponse {
    fn from_order(order: &Order) -> Self {
        Self {
            balance_due: FinancialManager::new().balance_due(order),
            order: order.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct IssueReceiptRequest {
    pub payment_percentage: f64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/orders", get(list_orders).post(create_order))
        .route("/v1/orders/{id}", get(get_order).delete(delete_order))
        .route("/v1/orders/{id}/status", axum::routing::patch(update_status))
        .route("/v1/orders/{id}/receipts", post(issue_receipt))
        .route("/v1/orders/{id}/receipts/{receipt_id}", axum::routing::delete(delete_receipt))
        .route("/v1/orders/{id}/receipts/{receipt_id}/send", post(send_receipt))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders
/// Convert an approved quote into an order
async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Json(quote): Json<Quote>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    claims.require(Permission::ManageOrders)?;
    millwork_order::validate_quote(&quote)?;

    let order = state.orders.lock().await.create_from_quote(&quote)?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from_order(&order))))
}

/// GET /v1/orders
async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    claims.require(Permission::ViewCatalog)?;

    let manager = state.orders.lock().await;
    let orders = manager.list_orders().into_iter().map(OrderResponse::from_order).collect();
    Ok(Json(orders))
}

/// GET /v1/orders/{id}
async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    claims.require(Permission::ViewCatalog)?;

    let manager = state.orders.lock().await;
    let order = manager
        .get_order(&order_id)
        .ok_or_else(|| AppError::NotFoundError(format!("Order not found: {}", order_id)))?;
    Ok(Json(OrderResponse::from_order(order)))
}

/// DELETE /v1/orders/{id}
async fn delete_order(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path(order_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    claims.require(Permission::ManageOrders)?;

    state.orders.lock().await.delete_order(&order_id)?;
    tracing::info!(%order_id, user = %claims.sub, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /v1/orders/{id}/status
async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    claims.require(Permission::ManageOrders)?;

    let mut manager = state.orders.lock().await;
    manager.update_status(&order_id, req.status)?;
    let order = manager.get_order_mut(&order_id)?;
    Ok(Json(OrderResponse::from_order(order)))
}

/// POST /v1/orders/{id}/receipts
/// Issue a partial-payment receipt for a percentage of the order total
async fn issue_receipt(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<IssueReceiptRequest>,
) -> Result<(StatusCode, Json<Receipt>), AppError> {
    claims.require(Permission::IssueReceipts)?;

    let mut manager = state.orders.lock().await;
    let order = manager.get_order_mut(&order_id)?;
    let receipt = FinancialManager::new().issue_receipt(order, req.payment_percentage)?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// POST /v1/orders/{id}/receipts/{receipt_id}/send
async fn send_receipt(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path((order_id, receipt_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Receipt>, AppError> {
    claims.require(Permission::IssueReceipts)?;

    let mut manager = state.orders.lock().await;
    let order = manager.get_order_mut(&order_id)?;
    let receipt = FinancialManager::new().mark_sent(order, receipt_id)?;
    Ok(Json(receipt))
}

/// DELETE /v1/orders/{id}/receipts/{receipt_id}
async fn delete_receipt(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path((order_id, receipt_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    claims.require(Permission::IssueReceipts)?;

    let mut manager = state.orders.lock().await;
    let order = manager.get_order_mut(&order_id)?;
    FinancialManager::new().delete_receipt(order, receipt_id)?;
    Ok(StatusCode::NO_CONTENT)
}
