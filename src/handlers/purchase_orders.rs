use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginatedResponse,
    PaginationParams, StatusUpdate,
};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    services::purchase_orders::{
        CreatePurchaseOrder, PurchaseOrderLineInput, UpdatePurchaseOrder, UpdatePurchaseOrderLine,
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post, put},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PurchaseOrderFilter {
    /// Pending, Approved, Rejected, Completed or Cancelled
    pub status: Option<String>,
    #[serde(alias = "supplier")]
    pub supplier_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders",
    params(PurchaseOrderFilter, PaginationParams),
    responses(
        (status = 200, description = "Purchase orders listed", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Unknown status filter", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(filter): Query<PurchaseOrderFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.resolve(&state.config);
    let (orders, total) = state
        .services
        .purchase_orders
        .list_purchase_orders(filter.status, filter.supplier_id, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        orders, page, per_page, total,
    )))
}

/// Creates a purchase order with its lines; `total_cost` is computed from the lines
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders",
    request_body = CreatePurchaseOrder,
    responses(
        (status = 201, description = "Purchase order created", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreatePurchaseOrder>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .create_purchase_order(payload, user.staff_id())
        .await
        .map_err(map_service_error)?;
    Ok(created_response(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = String, Path, description = "Purchase order ID, e.g. PO-0001")),
    responses(
        (status = 200, description = "Purchase order fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(po_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .get_purchase_order(&po_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

#[utoipa::path(
    put,
    path = "/api/v1/purchase-orders/{id}",
    request_body = UpdatePurchaseOrder,
    params(("id" = String, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn update_purchase_order(
    State(state): State<AppState>,
    Path(po_id): Path<String>,
    Json(payload): Json<UpdatePurchaseOrder>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .update_purchase_order(&po_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

#[utoipa::path(
    patch,
    path = "/api/v1/purchase-orders/{id}/status",
    request_body = StatusUpdate,
    params(("id" = String, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Status changed", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Unknown status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn update_purchase_order_status(
    State(state): State<AppState>,
    Path(po_id): Path<String>,
    Json(payload): Json<StatusUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .update_status(&po_id, &payload.status)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

#[utoipa::path(
    delete,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = String, Path, description = "Purchase order ID")),
    responses(
        (status = 204, description = "Purchase order deleted"),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn delete_purchase_order(
    State(state): State<AppState>,
    Path(po_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .purchase_orders
        .delete_purchase_order(&po_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/items",
    request_body = PurchaseOrderLineInput,
    params(("id" = String, Path, description = "Purchase order ID")),
    responses(
        (status = 201, description = "Line added", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid line", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn add_purchase_order_line(
    State(state): State<AppState>,
    Path(po_id): Path<String>,
    Json(payload): Json<PurchaseOrderLineInput>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .add_line(&po_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(order))
}

#[utoipa::path(
    put,
    path = "/api/v1/purchase-orders/{id}/items/{line_id}",
    request_body = UpdatePurchaseOrderLine,
    params(
        ("id" = String, Path, description = "Purchase order ID"),
        ("line_id" = i32, Path, description = "Line ID")
    ),
    responses(
        (status = 200, description = "Line updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Line not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn update_purchase_order_line(
    State(state): State<AppState>,
    Path((po_id, line_id)): Path<(String, i32)>,
    Json(payload): Json<UpdatePurchaseOrderLine>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .update_line(&po_id, line_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

#[utoipa::path(
    delete,
    path = "/api/v1/purchase-orders/{id}/items/{line_id}",
    params(
        ("id" = String, Path, description = "Purchase order ID"),
        ("line_id" = i32, Path, description = "Line ID")
    ),
    responses(
        (status = 200, description = "Line removed; the updated order is returned", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Line not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn remove_purchase_order_line(
    State(state): State<AppState>,
    Path((po_id, line_id)): Path<(String, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .remove_line(&po_id, line_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

pub fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/purchase-orders",
            get(list_purchase_orders).post(create_purchase_order),
        )
        .route(
            "/purchase-orders/:id",
            get(get_purchase_order)
                .put(update_purchase_order)
                .delete(delete_purchase_order),
        )
        .route(
            "/purchase-orders/:id/status",
            patch(update_purchase_order_status),
        )
        .route("/purchase-orders/:id/items", post(add_purchase_order_line))
        .route(
            "/purchase-orders/:id/items/:line_id",
            put(update_purchase_order_line).delete(remove_purchase_order_line),
        )
}
