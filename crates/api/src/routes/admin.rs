//! Admin dashboard endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use checkout::StatusUpdate;
use domain::{Money, Notification, Order, Product, ProductId};
use serde::{Deserialize, Serialize};
use store::Store;

use super::{AppState, OrderMessageResponse, parse_notification_id, parse_order_id};
use crate::auth::AdminUser;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct RestockRequest {
    pub quantity: i64,
}

/// Product upsert body; `createdAt` is assigned by the server.
#[derive(Deserialize)]
pub struct ProductRequest {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderListResponse {
    pub count: u64,
    pub orders: Vec<Order>,
}

#[derive(Serialize)]
pub struct NotificationListResponse {
    pub unread: u64,
    pub notifications: Vec<Notification>,
}

#[derive(Serialize)]
pub struct ProductMessageResponse {
    pub message: String,
    pub product: Product,
}

// -- Handlers --

/// GET /admin/orders: every order, newest first.
pub async fn list_orders<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
) -> Result<Json<OrderListResponse>, ApiError> {
    let (count, orders) = state.lifecycle.all_orders().await?;
    Ok(Json(OrderListResponse { count, orders }))
}

/// PUT /admin/orders/{id}/status: ship, deliver or cancel an order.
#[tracing::instrument(skip(state, admin, payload), fields(admin_id = %admin.0.id))]
pub async fn update_status<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    admin: AdminUser,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<OrderMessageResponse>, ApiError> {
    let id = parse_order_id(&id)?;
    let Json(request) = payload?;
    let status = StatusUpdate::parse(&request.status)
        .ok_or_else(|| ApiError::BadRequest("Invalid status".to_string()))?;

    let order = state.lifecycle.update_status(id, status).await?;
    Ok(Json(OrderMessageResponse {
        message: format!("Order status updated to {}", status.as_str()),
        order,
    }))
}

/// POST /admin/orders/{id}/cancel: cancel any pending order.
#[tracing::instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn cancel_order<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<OrderMessageResponse>, ApiError> {
    let id = parse_order_id(&id)?;
    let order = state.lifecycle.cancel(id).await?;
    Ok(Json(OrderMessageResponse {
        message: "Order cancelled".to_string(),
        order,
    }))
}

/// DELETE /admin/orders/{id}: remove an order document.
#[tracing::instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn delete_order<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<OrderMessageResponse>, ApiError> {
    let id = parse_order_id(&id)?;
    let order = state.lifecycle.delete_order(id).await?;
    Ok(Json(OrderMessageResponse {
        message: "Order deleted".to_string(),
        order,
    }))
}

/// PUT /admin/products: insert a product, or update the name and price of an existing one.
#[tracing::instrument(skip(state, admin, payload), fields(admin_id = %admin.0.id))]
pub async fn upsert_product<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    admin: AdminUser,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let Json(request) = payload?;
    let product = state
        .catalog
        .upsert_product(Product::new(
            request.id,
            request.name,
            request.price,
            request.stock,
        ))
        .await?;
    Ok(Json(product))
}

/// PUT /admin/products/{id}/restock: add units to stock.
#[tracing::instrument(skip(state, admin, payload), fields(admin_id = %admin.0.id))]
pub async fn restock<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    admin: AdminUser,
    Path(id): Path<String>,
    payload: Result<Json<RestockRequest>, JsonRejection>,
) -> Result<Json<ProductMessageResponse>, ApiError> {
    let Json(request) = payload?;
    let quantity = u32::try_from(request.quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| ApiError::BadRequest("Invalid quantity".to_string()))?;

    let product = state
        .catalog
        .restock(&ProductId::new(id), quantity)
        .await?;
    Ok(Json(ProductMessageResponse {
        message: format!("{} restocked successfully", product.name),
        product,
    }))
}

/// GET /admin/notifications: the inbox with its unread count.
pub async fn notifications<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let (unread, notifications) = state.notifier.inbox().await?;
    Ok(Json(NotificationListResponse {
        unread,
        notifications,
    }))
}

/// PUT /admin/notifications/{id}/read
pub async fn mark_read<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Notification>, ApiError> {
    let id = parse_notification_id(&id)?;
    let notification = state.notifier.mark_read(id).await?;
    Ok(Json(notification))
}
