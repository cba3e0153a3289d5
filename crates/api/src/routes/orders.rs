//! Customer order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use domain::{Address, Order};
use serde::Deserialize;
use store::Store;

use super::{AppState, OrderMessageResponse, parse_order_id};
use crate::auth::VerifiedUser;
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub billing_address: Option<Address>,
}

/// GET /orders/mine: the caller's orders, newest first.
pub async fn mine<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    VerifiedUser(user): VerifiedUser,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state.lifecycle.orders_for_customer(user.id).await?;
    Ok(Json(orders))
}

/// GET /orders/mine/{id}
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id = parse_order_id(&id)?;
    let order = state.lifecycle.order_for_customer(user.id, id).await?;
    Ok(Json(order))
}

/// POST /orders/{id}/cancel: cancel one of the caller's pending orders.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<String>,
) -> Result<Json<OrderMessageResponse>, ApiError> {
    let id = parse_order_id(&id)?;
    let order = state.lifecycle.cancel_for_customer(user.id, id).await?;
    Ok(Json(OrderMessageResponse {
        message: "Order cancelled successfully".to_string(),
        order,
    }))
}

/// PUT /orders/{id}/address: replace addresses before shipment.
#[tracing::instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_address<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateAddressRequest>, JsonRejection>,
) -> Result<Json<OrderMessageResponse>, ApiError> {
    let id = parse_order_id(&id)?;
    let Json(request) = payload?;
    let order = state
        .lifecycle
        .update_addresses(user.id, id, request.shipping_address, request.billing_address)
        .await?;
    Ok(Json(OrderMessageResponse {
        message: "Address updated successfully".to_string(),
        order,
    }))
}
