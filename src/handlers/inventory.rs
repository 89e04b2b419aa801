use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginatedResponse,
    PaginationParams,
};
use crate::{
    errors::ApiError,
    services::inventory::{CreateInventoryItem, DecreaseQuantity, UpdateInventoryItem},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct InventoryFilter {
    /// Matches item name or category
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LowStockQuery {
    /// Defaults to the configured low-stock threshold
    pub threshold: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(InventoryFilter, PaginationParams),
    responses(
        (status = 200, description = "Inventory listed", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(filter): Query<InventoryFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.resolve(&state.config);
    let (items, total) = state
        .services
        .inventory
        .list_items(filter.search, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        items, page, per_page, total,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}",
    params(("id" = String, Path, description = "Item ID, e.g. IT-0001")),
    responses(
        (status = 200, description = "Item fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .services
        .inventory
        .get_item(&item_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(item))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    params(LowStockQuery),
    responses(
        (status = 200, description = "Items at or below the threshold", body = crate::ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn get_low_stock_items(
    State(state): State<AppState>,
    Query(query): Query<LowStockQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let threshold = query.threshold.unwrap_or(state.config.low_stock_threshold);
    let items = state
        .services
        .inventory
        .low_stock(threshold)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(items))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = CreateInventoryItem,
    responses(
        (status = 201, description = "Item created", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn create_inventory(
    State(state): State<AppState>,
    Json(payload): Json<CreateInventoryItem>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .services
        .inventory
        .create_item(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(item))
}

#[utoipa::path(
    put,
    path = "/api/v1/inventory/{id}",
    request_body = UpdateInventoryItem,
    params(("id" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn update_inventory(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    Json(payload): Json<UpdateInventoryItem>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .services
        .inventory
        .update_item(&item_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(item))
}

#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{id}",
    params(("id" = String, Path, description = "Item ID")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn delete_inventory(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .inventory
        .delete_item(&item_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Takes stock out of an item. Requests beyond the quantity on hand are clamped at zero.
#[utoipa::path(
    post,
    path = "/api/v1/inventory/{id}/decrease",
    request_body = DecreaseQuantity,
    params(("id" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Quantity decreased", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn decrease_inventory(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    Json(payload): Json<DecreaseQuantity>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .services
        .inventory
        .decrease_quantity(&item_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(outcome))
}

/// Catalogue reads that need no token
pub fn inventory_public_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_inventory))
        .route("/inventory/:id", get(get_inventory))
}

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", post(create_inventory))
        .route("/inventory/low-stock", get(get_low_stock_items))
        .route(
            "/inventory/:id",
            axum::routing::put(update_inventory).delete(delete_inventory),
        )
        .route("/inventory/:id/decrease", post(decrease_inventory))
}
