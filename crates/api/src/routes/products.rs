//! Public catalogue reads.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::{Product, ProductId};
use store::Store;

use super::AppState;
use crate::error::ApiError;

/// GET /products/{id}
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state.catalog.product(&ProductId::new(id)).await?;
    Ok(Json(product))
}
