//! Middleware for protecting authenticated routes and handling authorization.
//!
//! `jwt_auth` validates the bearer token, confirms the subject still exists
//! with the same token version, and stores the `Claims` in the request
//! extensions. `admin_auth` must run after it.

use crate::api::common::{ApiError, service_error_to_http};
use crate::errors::ServiceError;
use crate::repositories::user_repository::UserRepository;
use crate::state::AppState;
use crate::utils::jwt::Claims;
use axum::{extract::Request, http::header::AUTHORIZATION, middleware::Next, response::Response};

const INVALID_CREDENTIALS: &str = "Missing or invalid bearer token";

fn unauthorized() -> ApiError {
    service_error_to_http(ServiceError::unauthorized(INVALID_CREDENTIALS))
}

/// JWT authentication middleware
pub async fn jwt_auth(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let state = request
        .extensions()
        .get::<AppState>()
        .cloned()
        .ok_or_else(|| {
            service_error_to_http(ServiceError::internal_error(
                "application state missing from request",
            ))
        })?;

    // Extract Authorization header
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;

    let claims = state.jwt.validate(token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        unauthorized()
    })?;

    let user = UserRepository::new(&state.pool)
        .get_user_by_id(&claims.sub)
        .await
        .map_err(|e| service_error_to_http(ServiceError::from(e)))?
        .ok_or_else(unauthorized)?;

    if user.token_version != claims.ver {
        return Err(unauthorized());
    }

    // Add claims to request extensions for use in handlers
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Admin role authorization middleware
pub async fn admin_auth(request: Request, next: Next) -> Result<Response, ApiError> {
    // Get claims from request extensions (should be set by jwt_auth middleware)
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(unauthorized)?;

    if !claims.is_admin() {
        return Err(service_error_to_http(ServiceError::permission_denied(
            "Administrator access required",
        )));
    }

    Ok(next.run(request).await)
}
