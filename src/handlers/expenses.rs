use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginatedResponse,
    PaginationParams,
};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    services::expenses::{CreateExpense, UpdateExpense},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ExpenseFilter {
    pub category: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    params(ExpenseFilter, PaginationParams),
    responses(
        (status = 200, description = "Expenses listed", body = crate::ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn list_expenses(
    State(state): State<AppState>,
    Query(filter): Query<ExpenseFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.resolve(&state.config);
    let (expenses, total) = state
        .services
        .expenses
        .list_expenses(filter.category, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        expenses, page, per_page, total,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/expenses",
    request_body = CreateExpense,
    responses(
        (status = 201, description = "Expense recorded", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn create_expense(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateExpense>,
) -> Result<impl IntoResponse, ApiError> {
    let expense = state
        .services
        .expenses
        .create_expense(payload, user.staff_id())
        .await
        .map_err(map_service_error)?;
    Ok(created_response(expense))
}

#[utoipa::path(
    get,
    path = "/api/v1/expenses/{id}",
    params(("id" = String, Path, description = "Expense ID, e.g. EXP-001")),
    responses(
        (status = 200, description = "Expense fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Expense not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn get_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let expense = state
        .services
        .expenses
        .get_expense(&expense_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(expense))
}

#[utoipa::path(
    put,
    path = "/api/v1/expenses/{id}",
    request_body = UpdateExpense,
    params(("id" = String, Path, description = "Expense ID")),
    responses(
        (status = 200, description = "Expense updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Expense not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn update_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<String>,
    Json(payload): Json<UpdateExpense>,
) -> Result<impl IntoResponse, ApiError> {
    let expense = state
        .services
        .expenses
        .update_expense(&expense_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(expense))
}

#[utoipa::path(
    delete,
    path = "/api/v1/expenses/{id}",
    params(("id" = String, Path, description = "Expense ID")),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 404, description = "Expense not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn delete_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .expenses
        .delete_expense(&expense_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

pub fn expense_routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route(
            "/expenses/:id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
}
