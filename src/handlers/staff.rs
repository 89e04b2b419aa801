use super::common::{
    created_response, map_service_error, success_response, PaginatedResponse, PaginationParams,
};
use crate::{
    errors::ApiError,
    models::status::LifecycleStatus,
    services::staff::{CreateStaff, UpdateStaff},
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
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StaffFilter {
    /// Active, Deactivated or Deleted; deleted accounts are only listed when asked for
    pub status: Option<String>,
    pub role: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/staff-profiles",
    params(StaffFilter, PaginationParams),
    responses(
        (status = 200, description = "Staff listed", body = crate::ApiResponse<serde_json::Value>),
        (status = 403, description = "Admin role required", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "staff"
)]
pub async fn list_staff(
    State(state): State<AppState>,
    Query(filter): Query<StaffFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.resolve(&state.config);
    let (staff, total) = state
        .services
        .staff
        .list_staff(filter.status, filter.role, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        staff, page, per_page, total,
    )))
}

/// Invites the staff member through the identity provider and stores the profile
#[utoipa::path(
    post,
    path = "/api/v1/staff-profiles",
    request_body = CreateStaff,
    responses(
        (status = 201, description = "Staff member invited", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email or username taken", body = crate::errors::ErrorResponse),
        (status = 502, description = "Invitation failed", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "staff"
)]
pub async fn create_staff(
    State(state): State<AppState>,
    Json(payload): Json<CreateStaff>,
) -> Result<impl IntoResponse, ApiError> {
    let staff = state
        .services
        .staff
        .create_staff(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(staff))
}

#[utoipa::path(
    get,
    path = "/api/v1/staff-profiles/{id}",
    params(("id" = Uuid, Path, description = "Staff profile ID")),
    responses(
        (status = 200, description = "Staff member fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Staff member not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "staff"
)]
pub async fn get_staff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let staff = state
        .services
        .staff
        .get_staff(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(staff))
}

#[utoipa::path(
    put,
    path = "/api/v1/staff-profiles/{id}",
    request_body = UpdateStaff,
    params(("id" = Uuid, Path, description = "Staff profile ID")),
    responses(
        (status = 200, description = "Staff member updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Staff member not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "staff"
)]
pub async fn update_staff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStaff>,
) -> Result<impl IntoResponse, ApiError> {
    let staff = state
        .services
        .staff
        .update_staff(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(staff))
}

/// Logical delete; the profile stays listable with `status=Deleted`
#[utoipa::path(
    delete,
    path = "/api/v1/staff-profiles/{id}",
    params(("id" = Uuid, Path, description = "Staff profile ID")),
    responses(
        (status = 200, description = "Staff member marked deleted", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Staff member not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "staff"
)]
pub async fn delete_staff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let staff = state
        .services
        .staff
        .delete_staff(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(staff))
}

#[utoipa::path(
    post,
    path = "/api/v1/staff-profiles/{id}/activate",
    params(("id" = Uuid, Path, description = "Staff profile ID")),
    responses(
        (status = 200, description = "Staff member activated", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Account is deleted", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "staff"
)]
pub async fn activate_staff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let staff = state
        .services
        .staff
        .set_status(id, LifecycleStatus::Active)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(staff))
}

#[utoipa::path(
    post,
    path = "/api/v1/staff-profiles/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Staff profile ID")),
    responses(
        (status = 200, description = "Staff member deactivated", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Account is deleted", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "staff"
)]
pub async fn deactivate_staff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let staff = state
        .services
        .staff
        .set_status(id, LifecycleStatus::Deactivated)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(staff))
}

#[utoipa::path(
    post,
    path = "/api/v1/staff-profiles/{id}/resend-invite",
    params(("id" = Uuid, Path, description = "Staff profile ID")),
    responses(
        (status = 200, description = "Invitation sent again", body = crate::ApiResponse<serde_json::Value>),
        (status = 502, description = "Invitation failed", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "staff"
)]
pub async fn resend_invite(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let staff = state
        .services
        .staff
        .resend_invite(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(staff))
}

/// Staff management; mounted behind the admin gate
pub fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/staff-profiles", get(list_staff).post(create_staff))
        .route(
            "/staff-profiles/:id",
            get(get_staff).put(update_staff).delete(delete_staff),
        )
        .route(
            "/staff-profiles/:id/activate",
            post(activate_staff).patch(activate_staff),
        )
        .route(
            "/staff-profiles/:id/deactivate",
            post(deactivate_staff).patch(deactivate_staff),
        )
        .route("/staff-profiles/:id/resend-invite", post(resend_invite))
}
