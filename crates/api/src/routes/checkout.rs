//! Checkout endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use checkout::{CheckoutRequest, ReleaseLine};
use domain::{PaymentMethod, ProductId};
use serde::Deserialize;
use store::Store;

use super::{AppState, MessageResponse, OrderMessageResponse};
use crate::auth::VerifiedUser;
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    pub order_items: Vec<RestoreLine>,
}

#[derive(Deserialize)]
pub struct RestoreLine {
    pub product: ProductId,
    pub quantity: u32,
}

/// POST /checkout: validate the cart, reserve stock and place the order.
#[tracing::instrument(skip(state, user, payload), fields(user_id = %user.0.id))]
pub async fn place<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: VerifiedUser,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderMessageResponse>), ApiError> {
    let Json(request) = payload?;
    let order = state
        .orchestrator
        .checkout(&user.0.customer(), request)
        .await?;

    let message = match order.payment_method() {
        PaymentMethod::CashOnDelivery => "Order placed successfully with Cash on Delivery",
        PaymentMethod::OnlinePayment => "Order placed successfully with Online Payment",
    };

    Ok((
        StatusCode::CREATED,
        Json(OrderMessageResponse {
            message: message.to_string(),
            order,
        }),
    ))
}

/// POST /checkout/restore: return stock held by an abandoned client checkout.
#[tracing::instrument(skip(state, _user, payload))]
pub async fn restore<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    _user: VerifiedUser,
    payload: Result<Json<RestoreRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    let lines: Vec<ReleaseLine> = request
        .order_items
        .into_iter()
        .map(|line| ReleaseLine::new(line.product, line.quantity))
        .collect();

    state.orchestrator.restore(&lines).await.map_err(|e| {
        tracing::error!(error = %e, "inventory restore failed");
        ApiError::BadRequest("Failed to restore inventory".to_string())
    })?;

    Ok(Json(MessageResponse::new("Inventory restored successfully")))
}
