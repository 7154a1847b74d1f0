//! Handler functions for carpark endpoints.

use super::models::{CarparkDto, CreateCarparkRequest};
use crate::api::common::{ApiError, paged_response, service_error_to_http};
use crate::services::carpark_service::CarparkService;
use crate::state::AppState;
use crate::utils::pagination::{PageRequest, ResourceParameters};
use axum::{
    extract::{Extension, Json, Path, Query},
    response::Response,
};
use validator::Validate;

#[axum::debug_handler]
pub async fn get_carparks(
    Extension(state): Extension<AppState>,
    Query(params): Query<ResourceParameters>,
) -> Result<Response, ApiError> {
    let request = PageRequest::from_parameters(params, state.config.max_page_size);

    let page = CarparkService::new(&state.pool)
        .list_carparks(&request)
        .await
        .map_err(service_error_to_http)?;

    paged_response(page.map(CarparkDto::from), &request, "/carparks")
}

#[axum::debug_handler]
pub async fn get_carpark(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CarparkDto>, ApiError> {
    let carpark = CarparkService::new(&state.pool)
        .get_carpark_required(&id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(CarparkDto::from(carpark)))
}

/// Adds a carpark. Admin only.
#[axum::debug_handler]
pub async fn create_carpark(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CreateCarparkRequest>,
) -> Result<Json<CarparkDto>, ApiError> {
    payload
        .validate()
        .map_err(|e| service_error_to_http(e.into()))?;

    let carpark = CarparkService::new(&state.pool)
        .create_carpark(payload.into())
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(CarparkDto::from(carpark)))
}
