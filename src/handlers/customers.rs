use super::common::{
    created_response, map_service_error, success_response, PaginatedResponse, PaginationParams,
};
use crate::{
    auth::AuthUser,
    errors::{ApiError, ServiceError},
    services::customers::{CreateCustomer, CustomerActionRequest, UpdateCustomer},
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
pub struct ProfileFilter {
    /// Active, Deactivated or Deleted
    pub status: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/profiles",
    params(ProfileFilter, PaginationParams),
    responses(
        (status = 200, description = "Customer profiles listed", body = crate::ApiResponse<serde_json::Value>),
        (status = 403, description = "Admin role required", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn list_profiles(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(filter): Query<ProfileFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    user.ensure_admin()?;
    let (page, per_page) = pagination.resolve(&state.config);
    let (customers, total) = state
        .services
        .customers
        .list_customers(filter.status, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        customers, page, per_page, total,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/profiles",
    request_body = CreateCustomer,
    responses(
        (status = 201, description = "Customer profile created", body = crate::ApiResponse<serde_json::Value>),
        (status = 403, description = "Profile belongs to another user", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn create_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(mut payload): Json<CreateCustomer>,
) -> Result<impl IntoResponse, ApiError> {
    if !user.is_admin() {
        // Self-registration: the profile is always keyed by the caller's identity
        if user.is_staff || payload.id.is_some_and(|id| id != user.user_id) {
            return Err(ServiceError::Forbidden(
                "Customers may only create their own profile".to_string(),
            )
            .into());
        }
        payload.id = Some(user.user_id);
    }
    let customer = state
        .services
        .customers
        .create_customer(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(customer))
}

#[utoipa::path(
    get,
    path = "/api/v1/profiles/{id}",
    params(("id" = String, Path, description = "Profile UUID or customer ID (CUS-0001)")),
    responses(
        (status = 200, description = "Customer profile fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 403, description = "Not the profile owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state
        .services
        .customers
        .get_customer(&key)
        .await
        .map_err(map_service_error)?;
    user.ensure_staff_or_owner(customer.id)?;
    Ok(success_response(customer))
}

#[utoipa::path(
    put,
    path = "/api/v1/profiles/{id}",
    request_body = UpdateCustomer,
    params(("id" = String, Path, description = "Profile UUID or customer ID")),
    responses(
        (status = 200, description = "Customer profile updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 403, description = "Not the profile owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(key): Path<String>,
    Json(payload): Json<UpdateCustomer>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = state
        .services
        .customers
        .get_customer(&key)
        .await
        .map_err(map_service_error)?;
    user.ensure_admin_or_owner(existing.id)?;
    let customer = state
        .services
        .customers
        .update_customer(&existing.id.to_string(), payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(customer))
}

#[utoipa::path(
    delete,
    path = "/api/v1/profiles/{id}",
    params(("id" = String, Path, description = "Profile UUID or customer ID")),
    responses(
        (status = 200, description = "Customer marked deleted", body = crate::ApiResponse<serde_json::Value>),
        (status = 403, description = "Not the profile owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = state
        .services
        .customers
        .get_customer(&key)
        .await
        .map_err(map_service_error)?;
    user.ensure_admin_or_owner(existing.id)?;
    let customer = state
        .services
        .customers
        .delete_customer(&existing.id.to_string())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(customer))
}

/// Admin activation switch for customer accounts
#[utoipa::path(
    patch,
    path = "/api/v1/customers/{id}",
    request_body = CustomerActionRequest,
    params(("id" = String, Path, description = "Profile UUID or customer ID")),
    responses(
        (status = 200, description = "Customer status changed", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Account is deleted", body = crate::errors::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn change_customer_status(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(payload): Json<CustomerActionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state
        .services
        .customers
        .set_status(&key, payload.action.target())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(customer))
}

/// Listing needs Admin; single profiles are open to their owner (staff may also read)
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profiles", get(list_profiles).post(create_profile))
        .route(
            "/profiles/:id",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
}

/// Mounted behind the admin gate
pub fn customer_admin_routes() -> Router<AppState> {
    Router::new().route("/customers/:id", patch(change_customer_status))
}
