use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginatedResponse,
    PaginationParams, StatusUpdate,
};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    services::vehicles::{CreateVehicle, UpdateVehicle},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, patch},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct VehicleFilter {
    /// Active, Under Maintenance or Retired
    pub status: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles",
    params(VehicleFilter, PaginationParams),
    responses(
        (status = 200, description = "Vehicles listed", body = crate::ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    Query(filter): Query<VehicleFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.resolve(&state.config);
    let (vehicles, total) = state
        .services
        .vehicles
        .list_vehicles(filter.status, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        vehicles, page, per_page, total,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/vehicles",
    request_body = CreateVehicle,
    responses(
        (status = 201, description = "Vehicle registered", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Inconsistent vehicle data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Plate number already registered", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateVehicle>,
) -> Result<impl IntoResponse, ApiError> {
    let vehicle = state
        .services
        .vehicles
        .create_vehicle(payload, user.staff_id())
        .await
        .map_err(map_service_error)?;
    Ok(created_response(vehicle))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles/{id}",
    params(("id" = String, Path, description = "Vehicle ID, e.g. VIN-001")),
    responses(
        (status = 200, description = "Vehicle fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Vehicle not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let vehicle = state
        .services
        .vehicles
        .get_vehicle(&vehicle_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(vehicle))
}

#[utoipa::path(
    put,
    path = "/api/v1/vehicles/{id}",
    request_body = UpdateVehicle,
    params(("id" = String, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Inconsistent vehicle data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vehicle not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn update_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(vehicle_id): Path<String>,
    Json(payload): Json<UpdateVehicle>,
) -> Result<impl IntoResponse, ApiError> {
    let vehicle = state
        .services
        .vehicles
        .update_vehicle(&vehicle_id, payload, user.staff_id())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(vehicle))
}

#[utoipa::path(
    patch,
    path = "/api/v1/vehicles/{id}/update_status",
    request_body = StatusUpdate,
    params(("id" = String, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Status changed", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid status", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn update_vehicle_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(vehicle_id): Path<String>,
    Json(payload): Json<StatusUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let vehicle = state
        .services
        .vehicles
        .update_status(&vehicle_id, &payload.status, user.staff_id())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(vehicle))
}

#[utoipa::path(
    delete,
    path = "/api/v1/vehicles/{id}",
    params(("id" = String, Path, description = "Vehicle ID")),
    responses(
        (status = 204, description = "Vehicle deleted"),
        (status = 404, description = "Vehicle not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .vehicles
        .delete_vehicle(&vehicle_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

pub fn vehicle_routes() -> Router<AppState> {
    Router::new()
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route(
            "/vehicles/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
        .route("/vehicles/:id/update_status", patch(update_vehicle_status))
}
