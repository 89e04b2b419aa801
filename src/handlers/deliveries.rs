use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginatedResponse,
    PaginationParams, StatusUpdate,
};
use crate::{
    errors::ApiError,
    services::deliveries::{CreateDelivery, UpdateDelivery},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DeliveryFilter {
    /// Pending, Packed, In Transit or Delivered
    pub status: Option<String>,
    #[serde(alias = "driver")]
    pub driver_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/v1/deliveries",
    params(DeliveryFilter, PaginationParams),
    responses(
        (status = 200, description = "Deliveries listed", body = crate::ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "deliveries"
)]
pub async fn list_deliveries(
    State(state): State<AppState>,
    Query(filter): Query<DeliveryFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.resolve(&state.config);
    let (deliveries, total) = state
        .services
        .deliveries
        .list_deliveries(filter.status, filter.driver_id, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        deliveries, page, per_page, total,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/deliveries",
    request_body = CreateDelivery,
    responses(
        (status = 201, description = "Delivery scheduled", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Unknown order, driver or vehicle", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already has a delivery", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "deliveries"
)]
pub async fn create_delivery(
    State(state): State<AppState>,
    Json(payload): Json<CreateDelivery>,
) -> Result<impl IntoResponse, ApiError> {
    let delivery = state
        .services
        .deliveries
        .create_delivery(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(delivery))
}

#[utoipa::path(
    get,
    path = "/api/v1/deliveries/{id}",
    params(("id" = String, Path, description = "Delivery ID, e.g. DEL-20240301-0001")),
    responses(
        (status = 200, description = "Delivery fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Delivery not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "deliveries"
)]
pub async fn get_delivery(
    State(state): State<AppState>,
    Path(delivery_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let delivery = state
        .services
        .deliveries
        .get_delivery(&delivery_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(delivery))
}

#[utoipa::path(
    put,
    path = "/api/v1/deliveries/{id}",
    request_body = UpdateDelivery,
    params(("id" = String, Path, description = "Delivery ID")),
    responses(
        (status = 200, description = "Delivery updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Delivery not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "deliveries"
)]
pub async fn update_delivery(
    State(state): State<AppState>,
    Path(delivery_id): Path<String>,
    Json(payload): Json<UpdateDelivery>,
) -> Result<impl IntoResponse, ApiError> {
    let delivery = state
        .services
        .deliveries
        .update_delivery(&delivery_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(delivery))
}

#[utoipa::path(
    put,
    path = "/api/v1/deliveries/{id}/update_status",
    request_body = StatusUpdate,
    params(("id" = String, Path, description = "Delivery ID")),
    responses(
        (status = 200, description = "Status changed", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Delivery not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "deliveries"
)]
pub async fn update_delivery_status(
    State(state): State<AppState>,
    Path(delivery_id): Path<String>,
    Json(payload): Json<StatusUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let delivery = state
        .services
        .deliveries
        .update_status(&delivery_id, &payload.status)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(delivery))
}

#[utoipa::path(
    delete,
    path = "/api/v1/deliveries/{id}",
    params(("id" = String, Path, description = "Delivery ID")),
    responses(
        (status = 204, description = "Delivery deleted"),
        (status = 404, description = "Delivery not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "deliveries"
)]
pub async fn delete_delivery(
    State(state): State<AppState>,
    Path(delivery_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .deliveries
        .delete_delivery(&delivery_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

pub fn delivery_routes() -> Router<AppState> {
    Router::new()
        .route("/deliveries", get(list_deliveries).post(create_delivery))
        .route(
            "/deliveries/:id",
            get(get_delivery)
                .put(update_delivery)
                .delete(delete_delivery),
        )
        .route("/deliveries/:id/update_status", put(update_delivery_status))
}
