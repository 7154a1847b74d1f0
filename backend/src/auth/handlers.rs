//! Handler functions for authentication-related API endpoints.
//!
//! These functions parse request data and delegate to `auth::service` for the
//! login, token check and password reset flows.

use crate::api::common::{ApiError, MessageResponse, service_error_to_http};
use crate::auth::models::*;
use crate::auth::service::AuthService;
use crate::state::AppState;
use axum::extract::{Extension, Json};

/// Handle user login request
#[axum::debug_handler]
pub async fn authenticate(
    Extension(state): Extension<AppState>,
    Json(payload): Json<AuthenticateRequest>,
) -> Result<Json<AuthenticatedUser>, ApiError> {
    let auth_service = AuthService::new(&state);

    match auth_service.authenticate(payload).await {
        Ok(response) => Ok(Json(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle forgotten password request by emailing a reset link
#[axum::debug_handler]
pub async fn forgot_password(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let auth_service = AuthService::new(&state);

    auth_service
        .forgot_password(payload)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(MessageResponse::new("Reset password email sent.")))
}

/// Handle password change with the current password
#[axum::debug_handler]
pub async fn reset_password(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let auth_service = AuthService::new(&state);

    auth_service
        .reset_password(payload)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(MessageResponse::new("Password reset successfully.")))
}

/// Handle token validity check for the reset page
#[axum::debug_handler]
pub async fn check_token(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CheckTokenRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let auth_service = AuthService::new(&state);

    auth_service
        .check_token(payload)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(MessageResponse::new("Token is valid.")))
}

/// Handle the final step of the emailed reset flow
#[axum::debug_handler]
pub async fn confirm_password(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ConfirmPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let auth_service = AuthService::new(&state);

    auth_service
        .confirm_password(payload)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(MessageResponse::new("Password successfully changed.")))
}
