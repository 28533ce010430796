use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use millwork_catalog::ProductError;
use millwork_core::CoreError;
use millwork_order::{OrderError, ValidationError};
use millwork_store::StoreError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    InvalidQuote(ValidationError),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, issues) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::InvalidQuote(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Quote validation failed".to_string(),
                Some(err.issues),
            ),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string(), None)
            },
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string(), None)
            },
        };

        let body = match issues {
            Some(issues) => Json(json!({ "error": error_message, "issues": issues })),
            None => Json(json!({ "error": error_message })),
        };

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::PermissionDenied { .. } => Self::AuthorizationError(err.to_string()),
            CoreError::ValidationError(msg) => Self::ValidationError(msg),
            CoreError::InternalError(msg) => Self::InternalServerError(msg),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidQuote(err)
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(_) | OrderError::ReceiptNotFound(_) => Self::NotFoundError(err.to_string()),
            OrderError::InvalidPaymentPercentage(_) => Self::ValidationError(err.to_string()),
            OrderError::InvalidTransition { .. }
            | OrderError::QuoteNotApproved(_)
            | OrderError::ExceedsBalance { .. }
            | OrderError::OrderCancelled
            | OrderError::ReceiptAlreadySent(_) => Self::ConflictError(err.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidRule { .. } => Self::ValidationError(err.to_string()),
            other => Self::Anyhow(other.into()),
        }
    }
}

impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) => Self::NotFoundError(err.to_string()),
            ProductError::NotAvailable(_) => Self::ConflictError(err.to_string()),
        }
    }
}
