use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginatedResponse,
    PaginationParams,
};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    services::stock_in::{CreateStockIn, UpdateStockIn},
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
pub struct StockInFilter {
    #[serde(alias = "item")]
    pub item_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/stockin",
    params(StockInFilter, PaginationParams),
    responses(
        (status = 200, description = "Stock-in records listed", body = crate::ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "stock-in"
)]
pub async fn list_stock_ins(
    State(state): State<AppState>,
    Query(filter): Query<StockInFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.resolve(&state.config);
    let (records, total) = state
        .services
        .stock_in
        .list_stock_ins(filter.item_id, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        records, page, per_page, total,
    )))
}

/// Records received stock and adds it to the item's quantity
#[utoipa::path(
    post,
    path = "/api/v1/stockin",
    request_body = CreateStockIn,
    responses(
        (status = 201, description = "Stock received", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock-in"
)]
pub async fn create_stock_in(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateStockIn>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .services
        .stock_in
        .create_stock_in(payload, user.staff_id())
        .await
        .map_err(map_service_error)?;
    Ok(created_response(record))
}

#[utoipa::path(
    get,
    path = "/api/v1/stockin/{id}",
    params(("id" = String, Path, description = "Stock-in ID")),
    responses(
        (status = 200, description = "Stock-in record fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Stock-in record not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock-in"
)]
pub async fn get_stock_in(
    State(state): State<AppState>,
    Path(stockin_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .services
        .stock_in
        .get_stock_in(&stockin_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(record))
}

#[utoipa::path(
    put,
    path = "/api/v1/stockin/{id}",
    request_body = UpdateStockIn,
    params(("id" = String, Path, description = "Stock-in ID")),
    responses(
        (status = 200, description = "Stock-in record updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Stock-in record not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock-in"
)]
pub async fn update_stock_in(
    State(state): State<AppState>,
    Path(stockin_id): Path<String>,
    Json(payload): Json<UpdateStockIn>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .services
        .stock_in
        .update_stock_in(&stockin_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(record))
}

#[utoipa::path(
    delete,
    path = "/api/v1/stockin/{id}",
    params(("id" = String, Path, description = "Stock-in ID")),
    responses(
        (status = 204, description = "Stock-in record deleted"),
        (status = 404, description = "Stock-in record not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock-in"
)]
pub async fn delete_stock_in(
    State(state): State<AppState>,
    Path(stockin_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .stock_in
        .delete_stock_in(&stockin_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

pub fn stock_in_routes() -> Router<AppState> {
    Router::new()
        .route("/stockin", get(list_stock_ins).post(create_stock_in))
        .route(
            "/stockin/:id",
            get(get_stock_in)
                .put(update_stock_in)
                .delete(delete_stock_in),
        )
}
