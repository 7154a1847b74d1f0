//! Handler functions for user registration and management endpoints.

use super::models::{RegisterUserRequest, UpdateUserRequest, UserDto};
use crate::api::common::{ApiError, paged_response, service_error_to_http};
use crate::errors::ServiceError;
use crate::services::user_service::UserService;
use crate::state::AppState;
use crate::utils::jwt::Claims;
use crate::utils::pagination::{PageRequest, ResourceParameters};
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::Response,
};
use validator::Validate;

/// Lists users one page at a time. Metadata goes in the `X-Pagination` header.
#[axum::debug_handler]
pub async fn get_users(
    Extension(state): Extension<AppState>,
    Query(params): Query<ResourceParameters>,
) -> Result<Response, ApiError> {
    let request = PageRequest::from_parameters(params, state.config.max_page_size);

    let user_service = UserService::new(&state.pool, state.config.auth.bcrypt_cost);
    let page = user_service
        .list_users(&request)
        .await
        .map_err(service_error_to_http)?;

    paged_response(page.map(UserDto::from), &request, "/users")
}

/// Retrieves a user by its ID.
#[axum::debug_handler]
pub async fn get_user(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserDto>, ApiError> {
    let user_service = UserService::new(&state.pool, state.config.auth.bcrypt_cost);
    let user = user_service
        .get_user_required(&id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(UserDto::from(user)))
}

/// Registers a new user account.
#[axum::debug_handler]
pub async fn register(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<UserDto>, ApiError> {
    payload
        .validate()
        .map_err(|e| service_error_to_http(e.into()))?;

    let user_service = UserService::new(&state.pool, state.config.auth.bcrypt_cost);
    let user = user_service
        .create_user(payload.into())
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(UserDto::from(user)))
}

/// Replaces a user's profile. Users may update themselves; admins anyone.
#[axum::debug_handler]
pub async fn update_user(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<StatusCode, ApiError> {
    if !claims.can_manage(&id) {
        return Err(service_error_to_http(ServiceError::permission_denied(
            "You may only update your own account",
        )));
    }

    payload
        .validate()
        .map_err(|e| service_error_to_http(e.into()))?;

    tracing::info!("User {} updating user {}", claims.sub, id);

    let (update, password) = payload.into_parts();
    let user_service = UserService::new(&state.pool, state.config.auth.bcrypt_cost);
    user_service
        .update_user(&id, update, password.as_deref())
        .await
        .map_err(service_error_to_http)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Deletes a user. Admin only.
#[axum::debug_handler]
pub async fn delete_user(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    tracing::info!("Admin {} deleting user {}", claims.sub, id);

    let user_service = UserService::new(&state.pool, state.config.auth.bcrypt_cost);
    user_service
        .delete_user(&id)
        .await
        .map_err(service_error_to_http)?;

    Ok(StatusCode::NO_CONTENT)
}
