//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::OrderError;
use store::StoreError;

/// Message returned when the backing store fails.
const UNAVAILABLE: &str = "Service temporarily unavailable";

/// API-level error type that maps to HTTP responses.
///
/// Every error renders as `{ "message": "..." }`.
#[derive(Debug)]
pub enum ApiError {
    /// No usable identity on the request.
    Unauthorized(String),
    /// Identity present but not allowed.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Checkout or lifecycle error.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl ApiError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let body = serde_json::json!({ "message": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::EmptyOrder
        | CheckoutError::InvalidQuantity { .. }
        | CheckoutError::InvalidDiscount
        | CheckoutError::PriceMismatch { .. }
        | CheckoutError::InsufficientStock { .. }
        | CheckoutError::TotalMismatch
        | CheckoutError::AmountOverflow
        | CheckoutError::PaymentFailed(_)
        | CheckoutError::InvalidRestockQuantity
        | CheckoutError::InvalidPrice(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::ProductNotFound(_)
        | CheckoutError::OrderNotFound(_)
        | CheckoutError::NotificationNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CheckoutError::Order(order_err) => match order_err {
            OrderError::AlreadyShipped { .. }
            | OrderError::InvalidQuantity { .. }
            | OrderError::NoItems => (StatusCode::BAD_REQUEST, err.to_string()),
            OrderError::InvalidStatusTransition { .. } | OrderError::AlreadyPaid => {
                (StatusCode::CONFLICT, err.to_string())
            }
        },
        CheckoutError::Store(StoreError::StockOverflow(_)) => {
            (StatusCode::BAD_REQUEST, "Invalid quantity".to_string())
        }
        CheckoutError::Store(store_err) => {
            tracing::error!(error = %store_err, "store failure");
            (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE.to_string())
        }
        CheckoutError::InvalidTransition { .. } => {
            tracing::error!(error = %err, "checkout state machine violated");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
